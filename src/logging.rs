use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE: &str = "gps_round_report.log";

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gps_round_report=debug"))
}

/// File-only logging for the dashboard; the terminal belongs to the UI.
/// Returns false when the directory is not writable and logging stays off.
pub fn init_file_logging(log_dir: &Path) -> bool {
    // `rolling::never` panics if it cannot create the file, so check first.
    if fs::create_dir_all(log_dir).is_err() {
        return false;
    }
    let probe = log_dir.join(".gps_write_test");
    if OpenOptions::new()
        .create(true)
        .append(true)
        .open(&probe)
        .is_err()
    {
        return false;
    }
    let _ = fs::remove_file(&probe);

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // The dashboard runs until exit; keep the flush guard alive for all of it.
    Box::leak(Box::new(guard));

    tracing_subscriber::registry()
        .with(default_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .is_ok()
}

/// Warnings and above to stderr, for the headless binaries.
pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
