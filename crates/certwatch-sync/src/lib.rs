//! # certwatch-sync
//!
//! Keeps a SQLite index of X.509 certificates in step with a directory of
//! `<name>.tar.gz` archives.
//!
//! Every archive owns a set of certificate records. Whenever the archive
//! changes, its whole set is replaced in one transaction; when it is deleted,
//! the set is removed. Readers never see a half-synced archive.
//!
//! ## Data Flow
//!
//! ```text
//! notify event ──> classify ──> bounded queue ──> consumer loop
//!                                                   │ in-flight guard
//!                                                   │ settle delay
//!                                                   v
//! rescan tick / manual trigger ──> SyncEngine ──> per-archive lock
//!                                                   │
//!                      ArchiveParser (blocking pool, read timeout)
//!                        └─ Extractor per `certs/*.crt` entry
//!                                                   │
//!                                   IndexStore::reconcile (one transaction)
//! ```

pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod hash;
pub mod index;
pub mod lock;
pub mod scheduler;
pub mod service;
pub mod watcher;

#[cfg(test)]
mod testutil;

pub use archive::{ArchiveParser, ParsedArchive};
pub use config::{MissingDirPolicy, SyncConfig};
pub use engine::{RescanSummary, SyncEngine, SyncOutcome};
pub use error::{Result, SyncError};
pub use extract::{Extractor, ParsedCertificate};
pub use index::{IndexStore, ReconcileReport};
pub use scheduler::{RescanHandle, RescanScheduler};
pub use service::{CertWatchService, ServiceMode};
pub use watcher::{ArchiveWatcher, WatchEvent};
