//! Process log output.
//!
//! Events are written as JSON lines to `log/application.log`, or to the file named by
//! `LOG_FILE`. When that file cannot be opened the logs go to stderr instead, so the
//! interactive prompt on stdout stays readable.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_ENV: &str = "LOG_FILE";
pub const DEFAULT_LOG_FILE: &str = "log/application.log";

/// Log file path from `lookup(LOG_FILE)`, falling back to [`DEFAULT_LOG_FILE`].
pub fn log_file_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    match lookup(LOG_FILE_ENV) {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_LOG_FILE),
    }
}

/// Open `path` for appending, creating missing parent directories.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let path = log_file_path(|key| std::env::var(key).ok());

    match open_log_file(&path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .init();
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "cannot open log file, logging to stderr"
            );
        }
    }
}
