use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Result,
    metadata::DEFAULT_TITLE_TIMEOUT,
    thumbnail::{DEFAULT_IMAGE_HOST, DEFAULT_THUMBNAIL_TIMEOUT},
};

/// User settings, stored as JSON in the platform config dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where finished files (and saved thumbnails) go
    pub download_dir: PathBuf,
    /// Directory holding yt-dlp and ffmpeg, if not the default location
    pub tools_dir: Option<PathBuf>,
    pub image_host: String,
    pub title_timeout_secs: u64,
    pub thumbnail_timeout_secs: u64,
    pub file_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            tools_dir: None,
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            title_timeout_secs: DEFAULT_TITLE_TIMEOUT.as_secs(),
            thumbnail_timeout_secs: DEFAULT_THUMBNAIL_TIMEOUT.as_secs(),
            file_logging: true,
        }
    }
}

impl Settings {
    /// Reads `path`, falling back to defaults when it is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Settings::default(),
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable settings");
                Settings::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn title_timeout(&self) -> Duration {
        Duration::from_secs(self.title_timeout_secs)
    }

    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_secs(self.thumbnail_timeout_secs)
    }
}

/// ~/.config/tube-queue (Linux), ~/Library/Application Support/tube-queue (macOS),
/// %APPDATA%\tube-queue (Windows)
pub fn app_config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default());
    base.join("tube-queue")
}

pub fn settings_path() -> PathBuf {
    app_config_dir().join("settings.json")
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yt-dlp-gui")
}
