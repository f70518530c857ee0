//! Debug logging support for mdtrim
//!
//! When debug mode is enabled via config or `--debug`, operations are logged
//! to ~/.mdtrim/mdtrim.log. The filter is read from `MDTRIM_LOG` and defaults
//! to `mdtrim=info`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

pub const LOG_FILE_NAME: &str = "mdtrim.log";
const DEFAULT_FILTER: &str = "mdtrim=info";

/// Initialize the debug logging system
///
/// Returns the path to the log file, or None if logging is not enabled or
/// the log file could not be set up.
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<PathBuf>> {
    if !debug_enabled {
        return Ok(None);
    }

    let log_dir = match crate::config::mdtrim_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {:#}", e);
            return Ok(None);
        }
    };
    init_debug_logging_in(&log_dir)
}

/// Set up file logging in `log_dir`
pub fn init_debug_logging_in(log_dir: &Path) -> Result<Option<PathBuf>> {
    if let Err(e) = fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))
    {
        // Logging must never break a run
        eprintln!("Warning: Could not create log file: {:#}", e);
        return Ok(None);
    }

    let log_path = log_dir.join(LOG_FILE_NAME);
    let file_appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(log_dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file {}: {}", log_path.display(), e);
            return Ok(None);
        }
    };

    let filter = EnvFilter::try_from_env("MDTRIM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: Failed to set tracing subscriber: {}", e);
        return Ok(None);
    }

    Ok(Some(log_path))
}

/// Get the log file path without initializing logging
///
/// This is used for the `mdtrim config --path` command
pub fn get_current_log_path() -> PathBuf {
    crate::config::mdtrim_dir()
        .map(|dir| dir.join(LOG_FILE_NAME))
        .unwrap_or_else(|_| PathBuf::from("~/.mdtrim/mdtrim.log"))
}
