//! Service configuration.
//!
//! A single YAML file controls the database location and the background job
//! cadences. Resolution order: an explicit path from the command line, then
//! `./task-relay.yaml`, then `~/.task-relay/config.yaml`. Every field has a
//! built-in default, so running without any config file works.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default database file name.
pub const DEFAULT_DB_FILE: &str = "task-relay.db";

/// User-level configuration directory (`~/.task-relay`).
pub fn user_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".task-relay"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Background job cadences.
    #[serde(default)]
    pub jobs: JobsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            jobs: JobsConfig::default(),
        }
    }
}

/// Cadence settings for the background jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Minutes between time-progress refresh runs (default: 30).
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u64,

    /// Minutes between warning-detection runs (default: 60).
    #[serde(default = "default_warning_minutes")]
    pub warning_minutes: u64,

    /// UTC hour of day for the daily periodic-recycle run (default: 2).
    #[serde(default = "default_recycle_hour")]
    pub recycle_hour: u32,

    /// UTC minute within that hour (default: 0).
    #[serde(default)]
    pub recycle_minute: u32,

    /// Minutes between statistics rebuild runs (default: 5).
    #[serde(default = "default_rebuild_minutes")]
    pub rebuild_minutes: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            refresh_minutes: default_refresh_minutes(),
            warning_minutes: default_warning_minutes(),
            recycle_hour: default_recycle_hour(),
            recycle_minute: 0,
            rebuild_minutes: default_rebuild_minutes(),
        }
    }
}

fn default_database() -> PathBuf {
    user_dir()
        .map(|d| d.join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

fn default_refresh_minutes() -> u64 {
    30
}

fn default_warning_minutes() -> u64 {
    60
}

fn default_recycle_hour() -> u32 {
    2
}

fn default_rebuild_minutes() -> u64 {
    5
}

impl Config {
    /// Load configuration from the first file found in the resolution order.
    ///
    /// An explicit path that does not exist is an error; the fallback
    /// locations are simply skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = PathBuf::from("task-relay.yaml");
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(user) = user_dir().map(|d| d.join("config.yaml"))
            && user.exists()
        {
            return Self::from_file(&user);
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
