//! Optional JSON trace log for diagnosing a live session after the fact.
//!
//! Only active with the `trace` feature; without it `init_tracing` reports
//! [`TraceError::Unavailable`] so callers can tell the user why no log
//! appears.

use std::path::Path;

/// File written inside the trace directory. Appended to across runs.
pub const TRACE_FILE: &str = "livefix-trace.jsonl";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "livefix_engine=debug,livefix_session=debug,livefix_core=debug";

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("trace logging needs a build with the `trace` feature")]
    Unavailable,
    #[error("cannot create trace directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Keeps the background log writer alive. Buffered lines are flushed when
/// it is dropped, so hold it until the process is done.
pub struct TraceGuard {
    #[cfg(feature = "trace")]
    _writer: tracing_appender::non_blocking::WorkerGuard,
}

/// Install a global subscriber writing one JSON object per event to
/// `<log_dir>/livefix-trace.jsonl`, creating the directory if needed.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> Result<TraceGuard, TraceError> {
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, TRACE_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_thread_names(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|_| TraceError::AlreadyInstalled)?;
    tracing::info!(dir = %log_dir.display(), "trace: logging started");
    Ok(TraceGuard { _writer: guard })
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> Result<TraceGuard, TraceError> {
    Err(TraceError::Unavailable)
}
