//! Append-only download queue.
//!
//! The queue lives on one thread. Workers only ever talk back through the
//! status channel, and [`DownloadQueue::poll_status`] applies what they said.

use std::{path::Path, sync::Arc};

use tracing::{info, warn};

use crate::{
    QueueError, Result,
    link::{extract_video_id, normalize},
    metadata::TitleSource,
    model::{DownloadFormat, DownloadStatus, QueueItem},
    status::{StatusReporter, StatusSender, status_channel},
    worker::{DownloadJob, DownloadRunner, spawn_worker},
};

pub struct DownloadQueue {
    items: Vec<QueueItem>,
    titles: Box<dyn TitleSource>,
    runner: Arc<dyn DownloadRunner>,
    sender: StatusSender,
    reporter: StatusReporter,
}

impl DownloadQueue {
    pub fn new(titles: impl TitleSource + 'static, runner: impl DownloadRunner) -> Self {
        let (sender, reporter) = status_channel();
        Self {
            items: Vec::new(),
            titles: Box::new(titles),
            runner: Arc::new(runner),
            sender,
            reporter,
        }
    }

    /// Validates `raw`, resolves its title and appends it. Returns the new index.
    pub fn enqueue(&mut self, raw: &str, format: DownloadFormat) -> Result<usize> {
        if raw.trim().is_empty() {
            return Err(QueueError::EmptyUrl);
        }

        let url = normalize(raw);
        let video_id =
            extract_video_id(&url).ok_or_else(|| QueueError::MissingVideoId(url.clone()))?;
        let title = self.titles.fetch_title(&url, &video_id);

        let index = self.items.len();
        info!(index, %video_id, format = format.tag(), %title, "queued");
        self.items.push(QueueItem {
            index,
            url,
            video_id,
            format,
            title,
            status: DownloadStatus::Queued,
        });
        Ok(index)
    }

    /// Starts a worker for every item that is neither downloading nor
    /// completed. Returns the indices that got a worker.
    pub fn download_all(&mut self, download_dir: &Path) -> Result<Vec<usize>> {
        if self.items.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        self.runner.preflight()?;

        let pending: Vec<usize> = self
            .items
            .iter()
            .filter(|item| !item.status.is_active_or_done())
            .map(|item| item.index)
            .collect();

        for &index in &pending {
            let item = &self.items[index];
            let job = DownloadJob {
                index,
                url: item.url.clone(),
                format: item.format,
                download_dir: download_dir.to_path_buf(),
            };

            self.on_status_changed(index, DownloadStatus::Downloading);
            if let Err(err) = spawn_worker(job, Arc::clone(&self.runner), self.sender.clone()) {
                warn!(index, error = %err, "could not start worker");
                self.on_status_changed(index, DownloadStatus::Error(Some(err.to_string())));
            }
        }

        info!(started = pending.len(), total = self.items.len(), "download all");
        Ok(pending)
    }

    /// Applies one status update. Out-of-range indices are ignored.
    pub fn on_status_changed(&mut self, index: usize, status: DownloadStatus) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.status = status;
        true
    }

    /// Applies every pending worker report. Returns the indices that changed.
    pub fn poll_status(&mut self) -> Vec<usize> {
        let mut changed = Vec::new();
        for update in self.reporter.drain() {
            if self.on_status_changed(update.index, update.status) {
                changed.push(update.index);
            }
        }
        changed
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True while any worker has not reported back yet.
    pub fn has_active(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == DownloadStatus::Downloading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    struct EchoId;
    impl TitleSource for EchoId {
        fn fetch_title(&self, _url: &str, fallback: &str) -> String {
            fallback.to_string()
        }
    }

    /// Records which items it was asked to download.
    #[derive(Clone, Default)]
    struct Recorder {
        ran: Arc<Mutex<Vec<usize>>>,
    }
    impl DownloadRunner for Recorder {
        fn run(&self, job: &DownloadJob) -> DownloadStatus {
            self.ran.lock().unwrap().push(job.index);
            DownloadStatus::Completed
        }
    }

    struct Unavailable;
    impl DownloadRunner for Unavailable {
        fn preflight(&self) -> Result<()> {
            Err(QueueError::DownloaderMissing {
                path: "bin/yt-dlp".into(),
            })
        }
        fn run(&self, _job: &DownloadJob) -> DownloadStatus {
            unreachable!("preflight failed")
        }
    }

    fn settle(queue: &mut DownloadQueue) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.has_active() {
            assert!(Instant::now() < deadline, "workers did not report back");
            queue.poll_status();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        assert!(matches!(
            queue.enqueue("   ", DownloadFormat::Mp4),
            Err(QueueError::EmptyUrl)
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn url_without_id_is_rejected() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        assert!(matches!(
            queue.enqueue("https://www.youtube.com/feed", DownloadFormat::Mp4),
            Err(QueueError::MissingVideoId(_))
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn indices_follow_call_order() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        assert_eq!(
            queue
                .enqueue("https://www.youtube.com/watch?v=first", DownloadFormat::Mp4)
                .unwrap(),
            0
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.enqueue("ytdlp://second", DownloadFormat::Mp3).unwrap(),
            1
        );
        assert_eq!(queue.len(), 2);

        let second = queue.get(1).unwrap();
        assert_eq!(second.url, "https://www.youtube.com/watch?v=second");
        assert_eq!(second.video_id, "second");
        assert_eq!(second.title, "second");
        assert_eq!(second.format, DownloadFormat::Mp3);
        assert_eq!(second.status, DownloadStatus::Queued);
    }

    #[test]
    fn status_update_touches_only_its_row() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        queue.enqueue("https://youtu.be/a", DownloadFormat::Mp4).unwrap();
        queue.enqueue("https://youtu.be/b", DownloadFormat::Mp4).unwrap();

        assert!(queue.on_status_changed(0, DownloadStatus::Completed));
        assert_eq!(queue.get(0).unwrap().status, DownloadStatus::Completed);
        assert_eq!(queue.get(1).unwrap().status, DownloadStatus::Queued);
    }

    #[test]
    fn out_of_range_update_is_ignored() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        queue.enqueue("https://youtu.be/a", DownloadFormat::Mp4).unwrap();

        assert!(!queue.on_status_changed(7, DownloadStatus::Completed));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(0).unwrap().status, DownloadStatus::Queued);
    }

    #[test]
    fn download_all_on_empty_queue_fails() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        assert!(matches!(
            queue.download_all(Path::new("/tmp")),
            Err(QueueError::EmptyQueue)
        ));
    }

    #[test]
    fn missing_downloader_starts_nothing() {
        let mut queue = DownloadQueue::new(EchoId, Unavailable);
        queue.enqueue("https://youtu.be/a", DownloadFormat::Mp4).unwrap();
        assert!(matches!(
            queue.download_all(Path::new("/tmp")),
            Err(QueueError::DownloaderMissing { .. })
        ));
        assert_eq!(queue.get(0).unwrap().status, DownloadStatus::Queued);
    }

    #[test]
    fn second_download_all_skips_completed_items() {
        let recorder = Recorder::default();
        let mut queue = DownloadQueue::new(EchoId, recorder.clone());
        queue.enqueue("https://youtu.be/a", DownloadFormat::Mp4).unwrap();

        assert_eq!(queue.download_all(Path::new("/tmp")).unwrap(), vec![0]);
        assert_eq!(queue.get(0).unwrap().status, DownloadStatus::Downloading);
        settle(&mut queue);
        assert_eq!(queue.get(0).unwrap().status, DownloadStatus::Completed);

        queue.enqueue("https://youtu.be/b", DownloadFormat::Mp3).unwrap();
        assert_eq!(queue.download_all(Path::new("/tmp")).unwrap(), vec![1]);
        settle(&mut queue);

        let mut ran = recorder.ran.lock().unwrap().clone();
        ran.sort();
        assert_eq!(ran, vec![0, 1]);
        assert!(queue.items().iter().all(|i| i.status == DownloadStatus::Completed));
    }

    #[test]
    fn downloading_items_are_not_started_twice() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        queue.enqueue("https://youtu.be/a", DownloadFormat::Mp4).unwrap();
        queue.on_status_changed(0, DownloadStatus::Downloading);

        assert!(queue.download_all(Path::new("/tmp")).unwrap().is_empty());
    }

    #[test]
    fn failed_items_are_started_again() {
        let mut queue = DownloadQueue::new(EchoId, Recorder::default());
        queue.enqueue("https://youtu.be/a", DownloadFormat::Mp4).unwrap();
        queue.on_status_changed(0, DownloadStatus::Error(None));

        assert_eq!(queue.download_all(Path::new("/tmp")).unwrap(), vec![0]);
        settle(&mut queue);
        assert_eq!(queue.get(0).unwrap().status, DownloadStatus::Completed);
    }
}
