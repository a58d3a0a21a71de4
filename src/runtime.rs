use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Runtime};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Shared runtime for timed external commands. Built on first use.
pub fn runtime() -> std::io::Result<&'static Runtime> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("tube-queue-rt")
            .enable_all()
            .build()
    })
}
