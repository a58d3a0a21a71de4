use std::fmt;

/// Output format picked when the video is queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadFormat {
    /// Best video + best audio merged into an mp4 container
    #[default]
    Mp4,
    /// Best audio stream extracted to mp3
    Mp3,
}

impl DownloadFormat {
    /// Short tag shown in front of each row
    pub fn tag(self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "MP4",
            DownloadFormat::Mp3 => "MP3",
        }
    }

    /// Label used by the format picker
    pub fn label(self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "MP4 (video)",
            DownloadFormat::Mp3 => "MP3 (audio)",
        }
    }
}

/// Represents the current state of a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Waiting for "download all"
    Queued,
    /// A worker owns the item
    Downloading,
    /// The downloader exited with code 0
    Completed,
    /// The downloader failed; launch faults carry their description
    Error(Option<String>),
}

impl DownloadStatus {
    /// Items in these states are skipped by "download all".
    pub fn is_active_or_done(&self) -> bool {
        matches!(self, DownloadStatus::Downloading | DownloadStatus::Completed)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Queued => f.write_str("Queued"),
            DownloadStatus::Downloading => f.write_str("Downloading..."),
            DownloadStatus::Completed => f.write_str("Completed"),
            DownloadStatus::Error(None) => f.write_str("Error (see log)"),
            DownloadStatus::Error(Some(detail)) => write!(f, "Error: {detail}"),
        }
    }
}

/// One requested download, as tracked by the queue and shown in the list
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// Position in the queue; also the key workers report back with
    pub index: usize,
    /// Canonical source URL
    pub url: String,
    /// Unique video identifier (extracted from the URL)
    pub video_id: String,
    pub format: DownloadFormat,
    /// Human-readable title (video title or, failing that, the id)
    pub title: String,
    pub status: DownloadStatus,
}

impl QueueItem {
    /// Text of this item's row in the queue list.
    pub fn display_text(&self) -> String {
        format!("[{}] {} - {}", self.format.tag(), self.title, self.status)
    }
}
