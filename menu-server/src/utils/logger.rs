//! Logging Infrastructure
//!
//! Console output always; a daily rolling file as well when a log
//! directory is given.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(log_level: &str) -> String {
    format!("menu_server={level},tower_http={level},http_access={level},security={level}", level = log_level)
}

/// Initialize the logger
pub fn init_logger() -> Option<WorkerGuard> {
    init_logger_with_file(None, None)
}

/// Initialize the logger with optional file output
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the life of the process. Calling this twice is harmless.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        match std::fs::create_dir_all(log_path) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(log_path, "menu-server");
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let _ = subscriber
                    .with_writer(std::io::stdout.and(file_writer))
                    .try_init();
                return Some(guard);
            }
            Err(e) => eprintln!("Cannot create log directory {}: {}", dir, e),
        }
    }

    let _ = subscriber.try_init();
    None
}
