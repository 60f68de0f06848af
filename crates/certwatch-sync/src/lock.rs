//! Per-archive mutual exclusion and in-flight event tracking.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

use certwatch_core::ArchiveName;

/// One async mutex per archive name.
///
/// Sync and remove of the same archive never interleave; different archives
/// proceed in parallel.
#[derive(Debug, Default)]
pub struct ArchiveLocks {
    locks: Mutex<HashMap<ArchiveName, Arc<tokio::sync::Mutex<()>>>>,
}

impl ArchiveLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`.
    pub async fn acquire(&self, name: &ArchiveName) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(name.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits for.
    pub fn prune(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of tracked archive locks
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Paths with a pending or running upsert.
///
/// A second event for a path already in flight is dropped; the running task
/// will read the file after it settles anyway.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` in flight, unless it already is.
    pub fn try_acquire(&self, path: &Path) -> Option<InFlightGuard> {
        let inserted = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf());
        inserted.then(|| InFlightGuard {
            registry: self.clone(),
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    fn release(&self, path: &Path) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }
}

/// Clears the in-flight mark when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlight,
    path: PathBuf,
}

impl InFlightGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.path);
    }
}
