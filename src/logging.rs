//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! Console output is always on (stderr, human-readable, `RUST_LOG`
//! controlled). When a logs directory is configured, a JSON file layer
//! with daily rotation is added on top.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Holds the non-blocking writer guard for file logging.
///
/// The [`WorkerGuard`] must be kept alive for the duration of the process.
/// Dropping it flushes pending log entries and closes the file.
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialise logging.
///
/// With `logs_dir` set, writes JSON logs to
/// `{logs_dir}/pagepulse.log.YYYY-MM-DD` with daily rotation in addition
/// to the console layer. The filter comes from `RUST_LOG`, falling back
/// to `default_level`.
///
/// Returns a [`LoggingGuard`] that must be kept alive for log flushing.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created.
pub fn init(default_level: &str, logs_dir: Option<&Path>) -> anyhow::Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match logs_dir {
        Some(dir) => {
            let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            std::fs::create_dir_all(dir).map_err(|e| {
                anyhow::anyhow!("failed to create logs directory {}: {e}", dir.display())
            })?;

            let file_appender = tracing_appender::rolling::daily(dir, "pagepulse.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .with(console_layer)
                .init();

            Ok(LoggingGuard {
                _guard: Some(guard),
            })
        }
        None => {
            let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .init();

            Ok(LoggingGuard { _guard: None })
        }
    }
}
