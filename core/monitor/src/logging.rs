//! Tracing setup: stderr always, plus a daily log file when a directory is given.

use fs_err as fs;
use std::env;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEBUG_ENV: &str = "TRAINER_MONITOR_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "trainer-monitor.log";

/// Installs the global subscriber. The returned guard must be held until
/// exit or buffered file output is lost.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_writer, guard) = match log_dir.map(open_file_writer) {
        Some(Ok((writer, guard))) => (Some(writer), Some(guard)),
        Some(Err(err)) => {
            eprintln!("trainer-monitor: file logging disabled: {}", err);
            (None, None)
        }
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer));
    let result = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();
    if let Err(err) = result {
        eprintln!("trainer-monitor: logging already initialized: {}", err);
    }
    guard
}

fn filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn open_file_writer(
    dir: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
