//! Structured logging bootstrap (spec §4.8 ambient stack), grounded on the
//! teacher's `tracing-subscriber` + `tracing-appender` setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Guard returned by [`init_logging`]; drop it to flush the non-blocking
/// file appender before process exit.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initializes the global `tracing` subscriber: an env-filtered stderr
/// layer, plus an optional JSON file layer when `log_dir` is set. Safe to
/// call once per process; a second call is a no-op (the underlying
/// `set_global_default` failure is swallowed, matching the usual
/// "init logging at most once" contract).
pub fn init_logging(log_dir: Option<&std::path::Path>) -> LoggingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "convo-core.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    LoggingGuard { _file_guard: file_guard }
}
