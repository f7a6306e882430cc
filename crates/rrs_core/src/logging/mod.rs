//! Logging: global tracing setup plus per-session log files.
//!
//! Crate code uses `tracing` macros for developer-facing diagnostics.
//! Each simulation session additionally gets a `SessionLogger` writing
//! a self-contained log file of its run, with an optional UI callback.

mod session_logger;
mod types;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub use session_logger::SessionLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Install the global tracing subscriber with a daily-rotating file
/// writer under `log_dir`.
///
/// Returns the appender guard; dropping it flushes buffered output, so
/// hold it for the life of the process.
pub fn init(log_dir: impl AsRef<Path>) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir.as_ref(), "rrs.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}
