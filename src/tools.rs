//! Where yt-dlp and ffmpeg live.
//!
//! Both tools sit in one directory. yt-dlp is invoked directly; ffmpeg is
//! only ever passed to yt-dlp by directory (`--ffmpeg-location`).

use std::{
    ffi::OsStr,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};

use rust_embed::RustEmbed;
use tracing::{debug, warn};

/// Binaries packed into release builds. Drop `yt-dlp`/`ffmpeg` into
/// `assets/` before building to ship them inside the executable.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct BundledTools;

pub const DOWNLOADER_BIN: &str = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };
pub const CONVERTER_BIN: &str = if cfg!(target_os = "windows") { "ffmpeg.exe" } else { "ffmpeg" };

/// Resolved locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Directory holding both tools; passed to yt-dlp as `--ffmpeg-location`.
    pub dir: PathBuf,
    /// Full path of the yt-dlp binary.
    pub downloader: PathBuf,
}

impl ToolPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let downloader = dir.join(DOWNLOADER_BIN);
        Self { dir, downloader }
    }

    pub fn downloader_available(&self) -> bool {
        self.downloader.is_file()
    }

    /// Picks the first directory that contains yt-dlp: the configured
    /// override, `bin/` next to the executable, then the embedded copies.
    /// When none does, the first candidate is returned so the error can name it.
    pub fn resolve(configured: Option<&Path>) -> Self {
        let mut candidates: Vec<ToolPaths> = Vec::new();
        if let Some(dir) = configured {
            candidates.push(ToolPaths::in_dir(dir));
        }
        if let Some(dir) = exe_bin_dir() {
            candidates.push(ToolPaths::in_dir(dir));
        }

        if let Some(found) = candidates.iter().find(|c| c.downloader_available()) {
            debug!(dir = %found.dir.display(), "using tools directory");
            return found.clone();
        }

        match extract_bundled() {
            Ok(Some(dir)) => return ToolPaths::in_dir(dir),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to extract bundled tools"),
        }

        candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| ToolPaths::in_dir("bin"))
    }
}

fn exe_bin_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("bin"))
}

/// Writes the embedded binaries into a temp directory once. Returns `None`
/// when this build carries no embedded yt-dlp.
fn extract_bundled() -> std::io::Result<Option<PathBuf>> {
    if BundledTools::get(DOWNLOADER_BIN).is_none() {
        return Ok(None);
    }

    let dir = std::env::temp_dir().join("tube-queue-tools");
    fs::create_dir_all(&dir)?;

    for name in [DOWNLOADER_BIN, CONVERTER_BIN] {
        let Some(data) = BundledTools::get(name) else {
            continue;
        };
        let target = dir.join(name);
        if target.exists() {
            continue;
        }
        let mut f = File::create(&target)?;
        f.write_all(&data.data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(0o755))?;
        }
        debug!(path = %target.display(), "extracted bundled tool");
    }

    Ok(Some(dir))
}

/// `Command` for a background tool: no console window pops up on Windows.
pub fn command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

/// Process creation flag that keeps a console window from appearing.
#[cfg(windows)]
pub(crate) const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}
