//! Logging setup: human-readable stdout plus a daily rolling file.
//!
//! Stdout is the audit trail a scheduler captures; the file under
//! `<app dir>/logs/` keeps the last week around for when it doesn't.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEBUG_ENV: &str = "FRIENDWATCH_DEBUG_LOG";
const KEEP_LOG_FILES: usize = 7;

/// Installs the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"))
    };

    let console_layer = fmt::layer().with_target(false);

    let (file_writer, guard) = match file_appender(log_dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "Warning: file logging disabled ({}): {}",
                log_dir.display(),
                e
            );
            (None, None)
        }
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn file_appender(log_dir: &Path) -> Result<RollingFileAppender, String> {
    fs_err::create_dir_all(log_dir).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("friendwatch")
        .filename_suffix("log")
        .max_log_files(KEEP_LOG_FILES)
        .build(log_dir)
        .map_err(|e| e.to_string())
}
