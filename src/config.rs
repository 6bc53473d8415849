//! Optional TOML configuration. Every key has a default, so a missing file is
//! fine; a file that exists but does not parse is a startup error.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::catalog::{CatalogSettings, DEFAULT_BOOKS_URL, DEFAULT_MOVIES_URL};
use crate::db::default_data_dir;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "MEDIA_DIARY_CONFIG";
/// Overrides `omdb_api_key`.
pub const OMDB_KEY_ENV: &str = "MEDIA_DIARY_OMDB_KEY";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Where the database and log file live. Defaults to the platform data
    /// directory.
    pub data_dir: Option<PathBuf>,
    /// Target directory for exports taken from the TUI.
    pub export_dir: PathBuf,
    pub omdb_api_key: Option<String>,
    pub books_url: String,
    pub movies_url: String,
    /// Quiet period after the last keystroke before a catalog search fires.
    pub debounce_ms: u64,
    pub http_timeout_secs: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            export_dir: PathBuf::from("."),
            omdb_api_key: None,
            books_url: DEFAULT_BOOKS_URL.to_string(),
            movies_url: DEFAULT_MOVIES_URL.to_string(),
            debounce_ms: 500,
            http_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `MEDIA_DIARY_CONFIG` or the platform config directory, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], but an explicit path wins and must exist.
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(default_config_path)
            {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(key) = env::var(OMDB_KEY_ENV) {
            if !key.trim().is_empty() {
                config.omdb_api_key = Some(key);
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse config")
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            books_url: self.books_url.clone(),
            movies_url: self.movies_url.clone(),
            omdb_api_key: self.omdb_api_key.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs.max(1)),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "media-diary").map(|dirs| dirs.config_dir().join("config.toml"))
}
