use std::io;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use localhist::kernel::services::adapters::ensure_log_dir;

/// Keeps the file writer flushing until the process exits.
pub struct LoggingGuard {
    _flush: WorkerGuard,
}

fn resolve_log_dir() -> Option<PathBuf> {
    match ensure_log_dir() {
        Ok(dir) => Some(dir),
        Err(_) => {
            let fallback = std::env::temp_dir().join("localhist").join("logs");
            std::fs::create_dir_all(&fallback).ok()?;
            Some(fallback)
        }
    }
}

/// Daily rolling file in the log directory plus compact stderr output.
/// `verbose` lowers the default filter to debug. `RUST_LOG` wins over both.
pub fn init(verbose: bool) -> Option<LoggingGuard> {
    let log_dir = resolve_log_dir()?;
    let (file_writer, flush) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "localhist.log"));

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("localhist={level}")));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .ok()?;

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
    tracing::debug!(log_dir = %log_dir.display(), "logging to file");

    Some(LoggingGuard { _flush: flush })
}
