//! Archive synchronization: parse, then reconcile, under a per-archive lock.

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use certwatch_core::{is_archive_path, ArchiveName};

use crate::archive::{ArchiveParser, ParsedArchive};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::index::IndexStore;
use crate::lock::ArchiveLocks;

/// Result of syncing one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub name: ArchiveName,
    /// Records now stored for the archive
    pub stored: usize,
    /// Certificate entries that could not be used
    pub skipped: usize,
}

/// Result of a full rescan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RescanSummary {
    /// Archive files found on disk
    pub seen: usize,
    /// Archives reconciled successfully
    pub synced: usize,
    /// Archives that failed to parse or reconcile
    pub failed: usize,
    /// Index entries removed because their archive is gone
    pub pruned: usize,
    /// Records stored across all synced archives
    pub records: usize,
}

/// Keeps the index in step with the archive directory.
#[derive(Debug)]
pub struct SyncEngine {
    index: Arc<IndexStore>,
    parser: ArchiveParser,
    archive_dir: PathBuf,
    read_timeout: Duration,
    locks: ArchiveLocks,
    /// Pause between parse and reconcile, to widen race windows in tests.
    #[cfg(test)]
    reconcile_delay: Duration,
}

impl SyncEngine {
    pub fn new(index: Arc<IndexStore>, config: &SyncConfig) -> Self {
        Self {
            index,
            parser: ArchiveParser::new(config.threshold_days),
            archive_dir: config.archive_dir.clone(),
            read_timeout: config.read_timeout(),
            locks: ArchiveLocks::new(),
            #[cfg(test)]
            reconcile_delay: Duration::ZERO,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_reconcile_delay(mut self, delay: Duration) -> Self {
        self.reconcile_delay = delay;
        self
    }

    pub const fn index(&self) -> &Arc<IndexStore> {
        &self.index
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Parse the archive at `path` and replace its records in the index.
    ///
    /// If the archive cannot be opened or read in time, the error is
    /// returned and the index keeps the archive's previous records.
    pub async fn sync_archive(&self, path: &Path) -> Result<SyncOutcome> {
        let name = ArchiveName::from_path(path)?;
        let _guard = self.locks.acquire(&name).await;

        let parsed = self.parse(path).await?;
        let ParsedArchive {
            name,
            records,
            skipped,
        } = parsed;

        #[cfg(test)]
        tokio::time::sleep(self.reconcile_delay).await;

        let index = Arc::clone(&self.index);
        let reconcile_name = name.clone();
        let report =
            tokio::task::spawn_blocking(move || index.reconcile(&reconcile_name, &records))
                .await??;

        info!(
            archive = %name,
            stored = report.inserted,
            replaced = report.removed,
            skipped,
            "archive synced"
        );
        Ok(SyncOutcome {
            name,
            stored: report.inserted,
            skipped,
        })
    }

    async fn parse(&self, path: &Path) -> Result<ParsedArchive> {
        let parser = self.parser;
        let owned = path.to_path_buf();
        let now = Utc::now().trunc_subsecs(0);
        let task = tokio::task::spawn_blocking(move || parser.parse(&owned, now));

        match tokio::time::timeout(self.read_timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(SyncError::ArchiveTimeout {
                path: path.display().to_string(),
                secs: self.read_timeout.as_secs(),
            }),
        }
    }

    /// Delete every record of `name`. Returns the number of records removed.
    pub async fn remove_archive(&self, name: &ArchiveName) -> Result<usize> {
        let guard = self.locks.acquire(name).await;
        let removed = self.remove_locked(name).await;
        drop(guard);
        self.locks.prune();
        removed
    }

    /// Remove `name` from the index unless its archive file exists again.
    ///
    /// Returns `None` when the file is present and nothing was removed.
    pub async fn remove_if_absent(&self, name: &ArchiveName) -> Result<Option<usize>> {
        let guard = self.locks.acquire(name).await;
        let path = name.path_in(&self.archive_dir);
        let result = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(archive = %name, "archive present again, keeping records");
            Ok(None)
        } else {
            self.remove_locked(name).await.map(Some)
        };
        drop(guard);
        self.locks.prune();
        result
    }

    async fn remove_locked(&self, name: &ArchiveName) -> Result<usize> {
        let index = Arc::clone(&self.index);
        let owned = name.clone();
        let removed = tokio::task::spawn_blocking(move || index.remove(&owned)).await??;
        info!(archive = %name, removed, "archive removed");
        Ok(removed)
    }

    /// Sync every archive in the directory, then drop index entries whose
    /// archive file no longer exists.
    pub async fn rescan_all(&self) -> Result<RescanSummary> {
        let paths = list_archives(&self.archive_dir).await?;
        let mut summary = RescanSummary {
            seen: paths.len(),
            ..RescanSummary::default()
        };

        let mut on_disk = HashSet::new();
        for path in &paths {
            if let Ok(name) = ArchiveName::from_path(path) {
                on_disk.insert(name);
            }
            match self.sync_archive(path).await {
                Ok(outcome) => {
                    summary.synced += 1;
                    summary.records += outcome.stored;
                }
                Err(e) => {
                    summary.failed += 1;
                    report_failure(path, &e);
                }
            }
        }

        let index = Arc::clone(&self.index);
        let indexed = tokio::task::spawn_blocking(move || index.archive_names()).await??;
        for name in indexed.iter().filter(|n| !on_disk.contains(*n)) {
            match self.remove_if_absent(name).await {
                Ok(Some(_)) => summary.pruned += 1,
                Ok(None) => {}
                Err(e) => error!(archive = %name, error = %e, "failed to prune vanished archive"),
            }
        }

        info!(
            seen = summary.seen,
            synced = summary.synced,
            failed = summary.failed,
            pruned = summary.pruned,
            records = summary.records,
            "rescan complete"
        );
        Ok(summary)
    }
}

/// Log a sync failure at the level its kind deserves.
pub fn report_failure(path: &Path, err: &SyncError) {
    if err.is_archive_failure() {
        warn!(path = %path.display(), error = %err, "archive skipped, index left unchanged");
    } else {
        error!(path = %path.display(), error = %err, "archive sync failed");
    }
}

/// Archive files directly inside `dir`, sorted by path.
pub async fn list_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SyncError::MissingDirectory(dir.to_path_buf()));
        }
        Err(e) => return Err(SyncError::io(dir.display().to_string(), e)),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::io(dir.display().to_string(), e))?
    {
        let path = entry.path();
        if !is_archive_path(&path) {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "archive vanished during scan"),
        }
    }
    paths.sort();
    Ok(paths)
}
