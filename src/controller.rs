//! Process-wide state behind the window: settings, the queue and the
//! thumbnail cache. Created empty at start-up and dropped at exit.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, warn};

use crate::{
    QueueError, Result,
    config::Settings,
    metadata::YtDlpTitles,
    model::DownloadFormat,
    queue::DownloadQueue,
    thumbnail::{HttpImageFetcher, ImageFetcher, Thumbnail, ThumbnailCache},
    tools::ToolPaths,
    worker::YtDlpRunner,
};

/// Characters that cannot appear in a file name on at least one platform.
const INVALID_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub struct Controller<F = HttpImageFetcher> {
    settings: Settings,
    settings_path: Option<PathBuf>,
    queue: DownloadQueue,
    thumbnails: ThumbnailCache<F>,
}

impl Controller {
    /// Wires the real yt-dlp and HTTP collaborators from `settings`.
    pub fn from_settings(settings: Settings, settings_path: Option<PathBuf>) -> Result<Self> {
        let tools = ToolPaths::resolve(settings.tools_dir.as_deref());
        info!(
            downloader = %tools.downloader.display(),
            available = tools.downloader_available(),
            "tools resolved"
        );

        let titles = YtDlpTitles::new(tools.downloader.clone(), settings.title_timeout());
        let queue = DownloadQueue::new(titles, YtDlpRunner::new(tools));
        let fetcher = HttpImageFetcher::new(settings.thumbnail_timeout())?;
        let thumbnails = ThumbnailCache::new(fetcher, settings.image_host.clone());

        Ok(Controller::with_parts(settings, settings_path, queue, thumbnails))
    }
}

impl<F: ImageFetcher> Controller<F> {
    pub fn with_parts(
        settings: Settings,
        settings_path: Option<PathBuf>,
        queue: DownloadQueue,
        thumbnails: ThumbnailCache<F>,
    ) -> Self {
        if let Err(err) = fs::create_dir_all(&settings.download_dir) {
            warn!(
                dir = %settings.download_dir.display(),
                error = %err,
                "could not create download folder"
            );
        }
        Self {
            settings,
            settings_path,
            queue,
            thumbnails,
        }
    }

    /// Queues `raw` and warms the thumbnail cache for it.
    pub fn enqueue(&mut self, raw: &str, format: DownloadFormat) -> Result<usize> {
        let index = self.queue.enqueue(raw, format)?;
        if let Some(item) = self.queue.get(index) {
            let video_id = item.video_id.clone();
            self.thumbnails.get(&video_id);
        }
        Ok(index)
    }

    pub fn download_all(&mut self) -> Result<Vec<usize>> {
        let dir = self.settings.download_dir.clone();
        self.queue.download_all(&dir)
    }

    pub fn poll_status(&mut self) -> Vec<usize> {
        self.queue.poll_status()
    }

    pub fn thumbnail_for(&mut self, index: usize) -> Option<Arc<Thumbnail>> {
        let video_id = self.queue.get(index)?.video_id.clone();
        self.thumbnails.get(&video_id)
    }

    /// Writes the thumbnail of row `index` into the download folder.
    pub fn save_thumbnail(&mut self, index: usize) -> Result<PathBuf> {
        let item = self.queue.get(index).ok_or(QueueError::NoSelection)?;
        let stem = safe_file_stem(&item.title, &item.video_id);
        let video_id = item.video_id.clone();

        let thumb = self
            .thumbnails
            .get(&video_id)
            .ok_or(QueueError::ThumbnailUnavailable)?;

        let path = self.settings.download_dir.join(format!("{stem}.jpg"));
        thumb.save(&path)?;
        info!(index, path = %path.display(), "thumbnail saved");
        Ok(path)
    }

    /// Switches the download folder, creating it and persisting the choice.
    pub fn set_download_dir(&mut self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.settings.download_dir = dir.to_path_buf();
        if let Some(path) = &self.settings_path {
            self.settings.save(path)?;
        }
        info!(dir = %dir.display(), "download folder changed");
        Ok(())
    }

    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    pub fn download_dir(&self) -> &Path {
        &self.settings.download_dir
    }
}

/// File name (without extension) derived from a title; falls back to the id.
pub fn safe_file_stem(title: &str, video_id: &str) -> String {
    let base = match title.trim() {
        "" => video_id,
        trimmed => trimmed,
    };
    let safe: String = base
        .chars()
        .filter(|c| !INVALID_FILE_CHARS.contains(c))
        .collect();
    if safe.is_empty() {
        video_id.to_string()
    } else {
        safe
    }
}
