//! Tracing setup.
//!
//! The TUI owns stdout, so events go to a log file when one is configured and
//! are discarded otherwise. `RUST_LOG` overrides the configured level.

use std::fs::{File, OpenOptions, create_dir_all};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub fn init_tracing(log_level: &str, log_file: Option<&str>) {
    let fallback_level = match log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file.and_then(open_log_file) {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::sink)
                .try_init();
        }
    }

    tracing::info!(
        log_level = fallback_level,
        log_file = log_file.unwrap_or("(discarded)"),
        "tracing initialized"
    );
}

fn open_log_file(path: &str) -> Option<File> {
    let file_path = Path::new(path);
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = create_dir_all(parent) {
                eprintln!("failed to create log directory '{}': {}", parent.display(), err);
                return None;
            }
        }
    }
    match OpenOptions::new().create(true).append(true).open(file_path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("failed to open log file '{}': {}", file_path.display(), err);
            None
        }
    }
}
