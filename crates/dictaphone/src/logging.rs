//! Console and rolling-file logging.

use crate::config::Config;

use std::fs;

use tracing::{info, warn};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "dictaphone=debug,dictaphone_core=debug";
const MAX_LOG_FILES: usize = 7;

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. Logs go to stderr and, when the
/// data directory is usable, to a daily rolling file. The returned guard
/// must be held until exit so buffered file output is flushed.
pub fn init() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let (file_layer, guard, file_error) = match open_log_file() {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard), None)
        }
        Err(reason) => (None, None, Some(reason)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    match file_error {
        None => info!("Logging initialized"),
        Some(reason) => warn!(reason = %reason, "File logging disabled"),
    }

    guard
}

fn open_log_file() -> Result<RollingFileAppender, String> {
    let log_dir = Config::log_dir().map_err(|e| e.to_string())?;
    fs::create_dir_all(&log_dir).map_err(|e| e.to_string())?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("dictaphone")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&log_dir)
        .map_err(|e| e.to_string())
}
