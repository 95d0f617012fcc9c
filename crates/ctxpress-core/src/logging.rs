//! Tracing subscriber setup shared by ctxpress binaries
//!
//! Logs go to stderr by default because stdout carries prompt text.
//! With a log file configured, output is written through a non-blocking
//! appender and the returned guard must live until the program exits.

use crate::error::{CoreError, CoreResult};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "CTXPRESS_LOG";

fn build_filter(level: &str) -> CoreResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| CoreError::Logging(format!("Invalid log level '{}': {}", level, e)))
}

/// Install the global subscriber
pub fn init(level: &str, log_file: Option<&Path>) -> CoreResult<Option<WorkerGuard>> {
    let filter = build_filter(level)?;

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| CoreError::Logging(e.to_string()))?;
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| CoreError::Logging(format!("Invalid log file: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    Ok(Some(guard))
}
