//! Core of the YouTube download queue: URL handling, titles, thumbnails,
//! the queue itself and the per-item yt-dlp workers.

pub mod config;
pub mod controller;
pub mod error;
pub mod link;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod queue;
pub mod runtime;
pub mod status;
pub mod thumbnail;
pub mod tools;
pub mod worker;

pub use controller::Controller;
pub use error::{QueueError, Result};
pub use model::{DownloadFormat, DownloadStatus, QueueItem};
pub use queue::DownloadQueue;
