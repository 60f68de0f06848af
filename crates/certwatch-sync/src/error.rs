//! Error types for the certificate sync engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while parsing archives or writing the index.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Filesystem access failed.
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PEM armor present but not a certificate, or malformed.
    #[error("pem decode failed for {path}: {reason}")]
    PemDecode { path: String, reason: String },

    /// Bytes are not a parseable X.509 certificate.
    #[error("certificate parse failed for {path}: {reason}")]
    CertParse { path: String, reason: String },

    /// Archive could not be opened or streamed (corrupt, truncated, wrong format).
    #[error("cannot open archive {path}: {reason}")]
    ArchiveOpen { path: String, reason: String },

    /// Reading an archive exceeded the configured timeout.
    #[error("reading archive {path} timed out after {secs}s")]
    ArchiveTimeout { path: String, secs: u64 },

    /// Index (SQLite) operation failed.
    #[error("index error: {0}")]
    Index(#[from] rusqlite::Error),

    /// A record handed to reconcile belongs to another archive.
    #[error("record {entry} belongs to archive {found}, not {expected}")]
    ArchiveMismatch {
        expected: String,
        found: String,
        entry: String,
    },

    /// Index connection is unusable.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Filesystem watcher failed.
    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// The archive directory does not exist.
    #[error("archive directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(String),

    /// JSON (de)serialization of stored fields failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Domain validation failed.
    #[error(transparent)]
    Core(#[from] certwatch_core::CoreError),
}

impl SyncError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Archive-level failure for `path`.
    pub fn archive_open(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ArchiveOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the failure concerns one archive's content rather than
    /// the engine itself. Such failures leave the index untouched.
    #[must_use]
    pub const fn is_archive_failure(&self) -> bool {
        matches!(
            self,
            Self::ArchiveOpen { .. } | Self::ArchiveTimeout { .. } | Self::Core(_)
        )
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
