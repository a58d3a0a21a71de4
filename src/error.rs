use std::path::PathBuf;
use thiserror::Error;

/// Failures that are reported to the user. Title, thumbnail and download
/// failures never show up here; they degrade to a fallback value instead.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("the URL is empty")]
    EmptyUrl,

    #[error("could not extract a video id from {0}")]
    MissingVideoId(String),

    #[error("yt-dlp was not found at {}", path.display())]
    DownloaderMissing { path: PathBuf },

    #[error("there are no videos in the queue")]
    EmptyQueue,

    #[error("select a video from the list first")]
    NoSelection,

    #[error("the thumbnail could not be fetched")]
    ThumbnailUnavailable,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
