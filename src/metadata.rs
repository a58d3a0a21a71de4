//! Best-effort video titles via `yt-dlp --get-title`.

use std::{
    path::PathBuf,
    process::Stdio,
    time::Duration,
};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::runtime::runtime;

pub const DEFAULT_TITLE_TIMEOUT: Duration = Duration::from_secs(20);

/// Something that can name a video. Never fails: the fallback is returned instead.
pub trait TitleSource {
    fn fetch_title(&self, url: &str, fallback: &str) -> String;
}

/// Asks yt-dlp for the title, killing it after `timeout`.
#[derive(Debug, Clone)]
pub struct YtDlpTitles {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlpTitles {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn query(&self, url: &str) -> Option<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--get-title")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(crate::tools::CREATE_NO_WINDOW);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                warn!(error = %err, "failed to run title query");
                return None;
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, url, "title query timed out");
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "title query failed"
            );
            return None;
        }

        first_line(&String::from_utf8_lossy(&output.stdout))
    }
}

impl TitleSource for YtDlpTitles {
    fn fetch_title(&self, url: &str, fallback: &str) -> String {
        if !self.program.is_file() {
            return fallback.to_string();
        }

        let rt = match runtime() {
            Ok(rt) => rt,
            Err(err) => {
                warn!(error = %err, "no runtime for title query");
                return fallback.to_string();
            }
        };

        rt.block_on(self.query(url))
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// First non-empty line, trimmed.
fn first_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
