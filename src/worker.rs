//! One thread per queued item, each running yt-dlp to completion.

use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    thread::{self, JoinHandle},
};

use tracing::{debug, info, warn};

use crate::{
    QueueError,
    model::{DownloadFormat, DownloadStatus},
    status::StatusSender,
    tools::{self, ToolPaths},
};

/// Everything a worker needs to know about its item.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub index: usize,
    pub url: String,
    pub format: DownloadFormat,
    pub download_dir: PathBuf,
}

/// Performs one download synchronously and returns the terminal status.
pub trait DownloadRunner: Send + Sync + 'static {
    /// Checked once before any worker is started.
    fn preflight(&self) -> crate::Result<()> {
        Ok(())
    }

    fn run(&self, job: &DownloadJob) -> DownloadStatus;
}

/// Runs the real yt-dlp binary.
#[derive(Debug, Clone)]
pub struct YtDlpRunner {
    tools: ToolPaths,
}

impl YtDlpRunner {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }
}

impl DownloadRunner for YtDlpRunner {
    fn preflight(&self) -> crate::Result<()> {
        if self.tools.downloader_available() {
            Ok(())
        } else {
            Err(QueueError::DownloaderMissing {
                path: self.tools.downloader.clone(),
            })
        }
    }

    fn run(&self, job: &DownloadJob) -> DownloadStatus {
        let args = build_args(job, &self.tools.dir);
        debug!(index = job.index, ?args, "starting yt-dlp");

        let output = match tools::command(&self.tools.downloader)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                warn!(index = job.index, error = %err, "failed to launch yt-dlp");
                return DownloadStatus::Error(Some(err.to_string()));
            }
        };

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(index = job.index, "yt-dlp> {line}");
        }

        if output.status.success() {
            info!(index = job.index, url = %job.url, "download completed");
            DownloadStatus::Completed
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                index = job.index,
                code = ?output.status.code(),
                stderr = %stderr.trim(),
                "yt-dlp failed"
            );
            DownloadStatus::Error(None)
        }
    }
}

/// yt-dlp arguments for one job; the URL is always last.
pub fn build_args(job: &DownloadJob, ffmpeg_dir: &Path) -> Vec<String> {
    let template = job.download_dir.join("%(title)s.%(ext)s");

    let mut args = vec![
        "-o".to_owned(),
        template.display().to_string(),
        "--ffmpeg-location".to_owned(),
        ffmpeg_dir.display().to_string(),
    ];

    let format_args: &[&str] = match job.format {
        DownloadFormat::Mp3 => &["-f", "bestaudio/best", "-x", "--audio-format", "mp3"],
        DownloadFormat::Mp4 => &["-f", "bv*+ba/b", "--merge-output-format", "mp4"],
    };
    args.extend(format_args.iter().map(|a| a.to_string()));

    args.push(job.url.clone());
    args
}

/// Starts the worker thread for `job`. The caller has already reported
/// `Downloading`; the thread reports exactly one terminal status.
pub fn spawn_worker(
    job: DownloadJob,
    runner: Arc<dyn DownloadRunner>,
    status: StatusSender,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("download-{}", job.index))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| runner.run(&job)))
                .unwrap_or_else(|payload| {
                    let detail = panic_message(payload.as_ref());
                    warn!(index = job.index, %detail, "download worker panicked");
                    DownloadStatus::Error(Some(detail))
                });
            status.send(job.index, outcome);
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(format: DownloadFormat) -> DownloadJob {
        DownloadJob {
            index: 3,
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            format,
            download_dir: PathBuf::from("/data/videos"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn mp3_requests_audio_extraction() {
        assert_eq!(
            build_args(&job(DownloadFormat::Mp3), Path::new("/opt/tools")),
            vec![
                "-o",
                "/data/videos/%(title)s.%(ext)s",
                "--ffmpeg-location",
                "/opt/tools",
                "-f",
                "bestaudio/best",
                "-x",
                "--audio-format",
                "mp3",
                "https://www.youtube.com/watch?v=abc",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn mp4_requests_merged_container() {
        assert_eq!(
            build_args(&job(DownloadFormat::Mp4), Path::new("/opt/tools")),
            vec![
                "-o",
                "/data/videos/%(title)s.%(ext)s",
                "--ffmpeg-location",
                "/opt/tools",
                "-f",
                "bv*+ba/b",
                "--merge-output-format",
                "mp4",
                "https://www.youtube.com/watch?v=abc",
            ]
        );
    }

    #[test]
    fn missing_binary_fails_preflight_and_run() {
        let dir = tempfile::tempdir().unwrap();
        let runner = YtDlpRunner::new(ToolPaths::in_dir(dir.path()));

        assert!(matches!(
            runner.preflight(),
            Err(QueueError::DownloaderMissing { .. })
        ));
        assert!(matches!(
            runner.run(&job(DownloadFormat::Mp4)),
            DownloadStatus::Error(Some(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_decides_outcome() {
        let ok = YtDlpRunner::new(ToolPaths {
            dir: PathBuf::from("/tmp"),
            downloader: PathBuf::from("/bin/true"),
        });
        assert_eq!(ok.run(&job(DownloadFormat::Mp3)), DownloadStatus::Completed);

        let failing = YtDlpRunner::new(ToolPaths {
            dir: PathBuf::from("/tmp"),
            downloader: PathBuf::from("/bin/false"),
        });
        assert_eq!(failing.run(&job(DownloadFormat::Mp3)), DownloadStatus::Error(None));
    }

    #[test]
    fn panicking_runner_still_reports_an_error() {
        struct Broken;
        impl DownloadRunner for Broken {
            fn run(&self, _job: &DownloadJob) -> DownloadStatus {
                panic!("runner blew up");
            }
        }

        let (tx, mut rx) = crate::status::status_channel();
        spawn_worker(job(DownloadFormat::Mp3), Arc::new(Broken), tx)
            .unwrap()
            .join()
            .unwrap();

        let updates = rx.drain();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].index, 3);
        assert_eq!(
            updates[0].status,
            DownloadStatus::Error(Some("runner blew up".to_string()))
        );
    }

    #[test]
    fn worker_reports_its_own_index() {
        struct Done;
        impl DownloadRunner for Done {
            fn run(&self, _job: &DownloadJob) -> DownloadStatus {
                DownloadStatus::Completed
            }
        }

        let (tx, mut rx) = crate::status::status_channel();
        spawn_worker(job(DownloadFormat::Mp4), Arc::new(Done), tx)
            .unwrap()
            .join()
            .unwrap();

        let updates = rx.drain();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].index, 3);
        assert_eq!(updates[0].status, DownloadStatus::Completed);
    }
}
