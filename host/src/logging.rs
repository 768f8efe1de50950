use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Layered logging: a stdout `fmt` layer filtered by `log_level`, plus an
/// optional rolling-daily JSON file layer when `log_path` is set. Returns
/// the `WorkerGuard` for the file layer's non-blocking writer; dropping it
/// flushes any buffered lines, so the caller must hold it for the life of
/// the process.
pub fn subscribe_log(log_path: &Option<PathBuf>, log_level: &str, max_log: usize) -> Option<WorkerGuard> {
    let stdout_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(stdout_filter);

    let Some(dir) = log_path else {
        tracing_subscriber::registry().with(stdout_layer).init();
        return None;
    };

    if let Err(e) = create_dir_all(dir) {
        eprintln!("failed to create log dir {}: {e}", dir.display());
        tracing_subscriber::registry().with(stdout_layer).init();
        return None;
    }

    let file_appender = match Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix("stagehand")
        .filename_suffix("log")
        .max_log_files(max_log)
        .build(dir as &Path)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("failed to open rolling log file in {}: {e}", dir.display());
            tracing_subscriber::registry().with(stdout_layer).init();
            return None;
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Some(guard)
}
