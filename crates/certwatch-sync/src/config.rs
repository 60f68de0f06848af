//! Sync service configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SyncError};

/// What to do when the archive directory is missing at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDirPolicy {
    /// Refuse to start.
    #[default]
    Fail,
    /// Skip the watcher; periodic rescans keep retrying the directory.
    SchedulerOnly,
}

impl FromStr for MissingDirPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "scheduler_only" | "scheduler-only" => Ok(Self::SchedulerOnly),
            other => Err(SyncError::Config(format!(
                "unknown missing_dir policy {other:?} (expected fail or scheduler_only)"
            ))),
        }
    }
}

/// Configuration for the certificate sync service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory holding `<name>.tar.gz` archives.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// SQLite index file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Full rescan period (seconds).
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Certificates with at most this many days left are `expiring_soon`.
    #[serde(default = "default_threshold_days")]
    pub threshold_days: u32,

    /// Wait after a filesystem event before reading the archive (ms).
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Upper bound on reading one archive (seconds).
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Bounded watcher event queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub missing_dir: MissingDirPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            database_path: default_database_path(),
            scan_interval_secs: default_scan_interval(),
            threshold_days: default_threshold_days(),
            settle_delay_ms: default_settle_delay(),
            read_timeout_secs: default_read_timeout(),
            queue_capacity: default_queue_capacity(),
            missing_dir: MissingDirPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Load config from an optional TOML file, apply `CERTWATCH_*`
    /// environment overrides, then validate. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| SyncError::io(path.display().to_string(), e))?;
                Self::from_toml_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; absent keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CERTWATCH_ARCHIVE_DIR") {
            self.archive_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CERTWATCH_DATABASE") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CERTWATCH_SCAN_INTERVAL_SECS") {
            self.scan_interval_secs = parse_env("CERTWATCH_SCAN_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("CERTWATCH_THRESHOLD_DAYS") {
            self.threshold_days = parse_env("CERTWATCH_THRESHOLD_DAYS", &v)?;
        }
        if let Some(v) = lookup("CERTWATCH_SETTLE_DELAY_MS") {
            self.settle_delay_ms = parse_env("CERTWATCH_SETTLE_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("CERTWATCH_READ_TIMEOUT_SECS") {
            self.read_timeout_secs = parse_env("CERTWATCH_READ_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("CERTWATCH_QUEUE_CAPACITY") {
            self.queue_capacity = parse_env("CERTWATCH_QUEUE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("CERTWATCH_MISSING_DIR") {
            self.missing_dir = v.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_secs == 0 {
            return Err(SyncError::Config("scan_interval_secs must be > 0".into()));
        }
        if self.read_timeout_secs == 0 {
            return Err(SyncError::Config("read_timeout_secs must be > 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(SyncError::Config("queue_capacity must be > 0".into()));
        }
        Ok(())
    }

    pub const fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SyncError::Config(format!("{key}={value:?}: {e}")))
}

// Default value functions for serde.
fn default_archive_dir() -> PathBuf {
    PathBuf::from("./certs")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./certwatch.db")
}

const fn default_scan_interval() -> u64 {
    300
}

const fn default_threshold_days() -> u32 {
    30
}

const fn default_settle_delay() -> u64 {
    1000
}

const fn default_read_timeout() -> u64 {
    30
}

const fn default_queue_capacity() -> usize {
    256
}
