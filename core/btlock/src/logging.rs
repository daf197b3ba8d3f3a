//! Logging setup.
//!
//! Always logs to stderr (colored on a terminal). `BTLOCK_LOG_DIR` adds a
//! daily-rolling plain-text file. `BTLOCK_DEBUG_LOG=1` forces debug level,
//! otherwise `RUST_LOG` applies, defaulting to info.

use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEBUG_ENV: &str = "BTLOCK_DEBUG_LOG";
const LOG_DIR_ENV: &str = "BTLOCK_LOG_DIR";
const LOG_FILE_PREFIX: &str = "btlock.log";

/// Installs the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    let (file_layer, guard, dir_error) = match log_dir() {
        Some(dir) => match fs_err::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer().with_writer(writer).with_ansi(false);
                (Some(layer), Some(guard), None)
            }
            Err(err) => (None, None, Some(err)),
        },
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(err) = dir_error {
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr only");
    }

    guard
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn log_dir() -> Option<PathBuf> {
    env::var_os(LOG_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
