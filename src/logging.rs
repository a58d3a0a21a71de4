use once_cell::sync::OnceCell;
use std::path::PathBuf;

use tracing_appender::{
    non_blocking::{self, WorkerGuard},
    rolling::RollingFileAppender,
};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

static GUARD: OnceCell<WorkerGuard> = OnceCell::new(); // keep writer alive

const LOG_FILE: &str = "tube-queue.log";
const KEEP_LOGS: usize = 10;

pub fn log_dir() -> PathBuf {
    crate::config::app_config_dir().join("logs")
}

/// Initialize the global subscriber. Call once at start-up.
///
/// Console output follows `RUST_LOG` (default `info`). With `file_enabled`,
/// everything at debug and above also goes to a daily rolling file, which is
/// where yt-dlp's own output ends up.
pub fn init(file_enabled: bool) {
    let console = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_thread_names(true)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    let file_layer = if file_enabled {
        let dir = log_dir();
        let _ = std::fs::create_dir_all(&dir);
        prune_old_logs(&dir);

        let appender: RollingFileAppender = tracing_appender::rolling::daily(&dir, LOG_FILE);
        let (writer, guard): (non_blocking::NonBlocking, WorkerGuard) =
            tracing_appender::non_blocking(appender);
        let _ = GUARD.set(guard);

        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new("tube_queue=debug,info")),
        )
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();
}

/// Keep the newest rotated logs only.
fn prune_old_logs(dir: &std::path::Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let mut files: Vec<_> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| e.file_name().to_string_lossy().starts_with(LOG_FILE))
        .collect();

    files.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok()); // oldest first

    if files.len() > KEEP_LOGS {
        let excess = files.len() - KEEP_LOGS;
        for e in files.iter().take(excess) {
            let _ = std::fs::remove_file(e.path());
        }
    }
}
