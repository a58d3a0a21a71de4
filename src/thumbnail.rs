//! Downloading, decoding and memoizing video thumbnails.

use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use image::RgbaImage;
use reqwest::{StatusCode, blocking::Client};
use tracing::{debug, info};

pub const DEFAULT_IMAGE_HOST: &str = "img.youtube.com";
pub const DEFAULT_THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolution variants tried in order.
const VARIANTS: [&str; 2] = ["maxresdefault.jpg", "hqdefault.jpg"];

/// Fetches raw image bytes. `None` means "no image here": transport errors
/// and non-200 answers alike.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

/// Blocking HTTP fetcher with a per-request timeout.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(err) => {
                debug!(url, error = %err, "thumbnail request failed");
                return None;
            }
        };
        if resp.status() != StatusCode::OK {
            debug!(url, status = %resp.status(), "thumbnail not available");
            return None;
        }
        resp.bytes().ok().map(|b| b.to_vec())
    }
}

/// A decoded thumbnail together with the bytes it came from.
#[derive(Debug)]
pub struct Thumbnail {
    /// Image as served by the host (JPEG)
    pub bytes: Vec<u8>,
    /// Decoded RGBA pixels for display
    pub image: RgbaImage,
}

impl Thumbnail {
    fn decode(bytes: Vec<u8>) -> Option<Self> {
        let image = image::load_from_memory(&bytes).ok()?.to_rgba8();
        Some(Self { bytes, image })
    }

    pub fn size(&self) -> [usize; 2] {
        [self.image.width() as usize, self.image.height() as usize]
    }

    /// Writes the original bytes to `path`.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Thumbnails keyed by video id. Entries live for the whole process and
/// failures are not remembered, so a miss is retried on the next call.
pub struct ThumbnailCache<F = HttpImageFetcher> {
    fetcher: F,
    host: String,
    entries: HashMap<String, Arc<Thumbnail>>,
}

impl<F: ImageFetcher> ThumbnailCache<F> {
    pub fn new(fetcher: F, host: impl Into<String>) -> Self {
        Self {
            fetcher,
            host: host.into(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, video_id: &str) -> Option<Arc<Thumbnail>> {
        if let Some(hit) = self.entries.get(video_id) {
            return Some(Arc::clone(hit));
        }

        for url in thumbnail_urls(&self.host, video_id) {
            let Some(bytes) = self.fetcher.fetch(&url) else {
                continue;
            };
            let Some(thumb) = Thumbnail::decode(bytes) else {
                debug!(%url, "thumbnail could not be decoded");
                continue;
            };
            info!(video_id, %url, "thumbnail cached");
            let thumb = Arc::new(thumb);
            self.entries.insert(video_id.to_string(), Arc::clone(&thumb));
            return Some(thumb);
        }

        None
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.entries.contains_key(video_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn thumbnail_urls(host: &str, video_id: &str) -> Vec<String> {
    VARIANTS
        .iter()
        .map(|variant| format!("https://{host}/vi/{video_id}/{variant}"))
        .collect()
}
