//! `tracing` subscriber setup. The TUI owns stdout, so interactive sessions
//! log to a file in the data directory; headless commands log to stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "media-diary.log";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Append log lines to `media-diary.log` inside `data_dir`.
pub fn init_file_logging(data_dir: &Path, default_level: &str) -> Result<()> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))
        .context("failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))
}

/// Log to stderr, for commands that do not take over the terminal.
pub fn init_stderr_logging(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))
}
