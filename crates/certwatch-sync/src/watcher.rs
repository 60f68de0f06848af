//! Filesystem watcher for the archive directory.
//!
//! The notify callback only classifies events and pushes them onto a bounded
//! queue. A single consumer loop turns them into sync and remove tasks.

use notify::event::{AccessKind, AccessMode, EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use certwatch_core::{is_archive_path, ArchiveName};

use crate::config::SyncConfig;
use crate::engine::{report_failure, SyncEngine};
use crate::error::{Result, SyncError};
use crate::lock::{InFlight, InFlightGuard};

/// A change to one archive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Created, modified or renamed into place.
    Upsert(PathBuf),
    /// Deleted or renamed away.
    Remove(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Upsert(p) | Self::Remove(p) => p,
        }
    }
}

/// Translate a raw notify event into archive events.
///
/// Paths without the archive suffix are dropped.
pub fn classify(event: &Event) -> Vec<WatchEvent> {
    let upsert = |p: &PathBuf| WatchEvent::Upsert(p.clone());
    let remove = |p: &PathBuf| WatchEvent::Remove(p.clone());

    let events: Vec<WatchEvent> = match event.kind {
        EventKind::Create(_) | EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            event.paths.iter().map(upsert).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            event.paths.iter().map(remove).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().map(upsert).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![remove(from), upsert(to)],
            other => other.iter().map(upsert).collect(),
        },
        // Rename of unknown direction: trust the filesystem.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| if p.exists() { upsert(p) } else { remove(p) })
            .collect(),
        EventKind::Modify(_) => event.paths.iter().map(upsert).collect(),
        _ => Vec::new(),
    };

    events
        .into_iter()
        .filter(|e| is_archive_path(e.path()))
        .collect()
}

/// Watches the archive directory and keeps the index in step with it.
pub struct ArchiveWatcher {
    engine: Arc<SyncEngine>,
    settle_delay: Duration,
    queue_capacity: usize,
    in_flight: InFlight,
}

impl ArchiveWatcher {
    pub fn new(engine: Arc<SyncEngine>, config: &SyncConfig) -> Self {
        Self {
            engine,
            settle_delay: config.settle_delay(),
            queue_capacity: config.queue_capacity,
            in_flight: InFlight::new(),
        }
    }

    /// Attach to the archive directory, then run the initial scan and the
    /// event loop in the background until `shutdown` fires. Shutdown
    /// cancels the initial scan along with any pending archive tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, shutdown: broadcast::Receiver<()>) -> Result<JoinHandle<()>> {
        let dir = self.engine.archive_dir().to_path_buf();
        if !dir.is_dir() {
            return Err(SyncError::MissingDirectory(dir));
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for ev in classify(&event) {
                        if let Err(e) = tx.try_send(ev) {
                            match e {
                                mpsc::error::TrySendError::Full(ev) => warn!(
                                    path = %ev.path().display(),
                                    "event queue full, dropping event"
                                ),
                                mpsc::error::TrySendError::Closed(_) => {
                                    debug!("event queue closed");
                                }
                            }
                        }
                    }
                }
                Err(e) => error!(error = %e, "filesystem watcher error"),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(dir = %dir.display(), "watching archive directory");

        Ok(tokio::spawn(self.run(rx, shutdown, watcher)))
    }

    async fn run(
        self,
        mut rx: mpsc::Receiver<WatchEvent>,
        mut shutdown: broadcast::Receiver<()>,
        watcher: RecommendedWatcher,
    ) {
        let mut tasks = JoinSet::new();
        let engine = Arc::clone(&self.engine);
        tasks.spawn(async move {
            if let Err(e) = engine.rescan_all().await {
                warn!(error = %e, "initial scan failed");
            }
        });

        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(event) => self.dispatch(event, &mut tasks),
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "archive task failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("watcher shutting down");
                    break;
                }
            }
        }
        drop(watcher);
        tasks.shutdown().await;
    }

    fn dispatch(&self, event: WatchEvent, tasks: &mut JoinSet<()>) {
        match event {
            WatchEvent::Upsert(path) => {
                let Some(guard) = self.in_flight.try_acquire(&path) else {
                    debug!(path = %path.display(), "archive already in flight, dropping event");
                    return;
                };
                tasks.spawn(upsert(
                    Arc::clone(&self.engine),
                    guard,
                    self.settle_delay,
                ));
            }
            WatchEvent::Remove(path) => {
                let name = match ArchiveName::from_path(&path) {
                    Ok(name) => name,
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "ignoring removal");
                        return;
                    }
                };
                let engine = Arc::clone(&self.engine);
                tasks.spawn(async move {
                    if let Err(e) = engine.remove_if_absent(&name).await {
                        error!(archive = %name, error = %e, "failed to remove archive");
                    }
                });
            }
        }
    }
}

/// Wait for writes to settle, then sync. The guard is held throughout.
async fn upsert(engine: Arc<SyncEngine>, guard: InFlightGuard, settle: Duration) {
    tokio::time::sleep(settle).await;
    let path = guard.path();
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "archive gone before sync");
        return;
    }
    if let Err(e) = engine.sync_archive(path).await {
        report_failure(path, &e);
    }
}
