//! Service orchestration: index, engine, watcher and scheduler.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{MissingDirPolicy, SyncConfig};
use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};
use crate::index::IndexStore;
use crate::scheduler::{RescanHandle, RescanScheduler};
use crate::watcher::ArchiveWatcher;

/// How the service is keeping the index current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Watcher plus periodic rescans.
    Full,
    /// Archive directory was missing; periodic rescans only.
    SchedulerOnly,
}

/// A running certificate sync service.
pub struct CertWatchService {
    engine: Arc<SyncEngine>,
    rescan: RescanHandle,
    mode: ServiceMode,
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl CertWatchService {
    /// Open the index at `config.database_path` and start.
    pub async fn start(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let db_path = config.database_path.clone();
        let index = tokio::task::spawn_blocking(move || IndexStore::open(db_path)).await??;
        Self::start_with_index(config, Arc::new(index))
    }

    /// Start against an already opened index.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with_index(config: SyncConfig, index: Arc<IndexStore>) -> Result<Self> {
        let engine = Arc::new(SyncEngine::new(index, &config));
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = Vec::new();

        let watcher = ArchiveWatcher::new(Arc::clone(&engine), &config);
        let mode = match watcher.start(shutdown_tx.subscribe()) {
            Ok(handle) => {
                handles.push(handle);
                ServiceMode::Full
            }
            Err(SyncError::MissingDirectory(dir))
                if config.missing_dir == MissingDirPolicy::SchedulerOnly =>
            {
                warn!(
                    dir = %dir.display(),
                    "archive directory missing, running periodic rescans only"
                );
                ServiceMode::SchedulerOnly
            }
            Err(e) => return Err(e),
        };

        let (scheduler, rescan) = RescanScheduler::new(Arc::clone(&engine), config.scan_interval());
        handles.push(tokio::spawn(scheduler.run(shutdown_tx.subscribe())));

        info!(
            archive_dir = %config.archive_dir.display(),
            database = %config.database_path.display(),
            interval_secs = config.scan_interval_secs,
            threshold_days = config.threshold_days,
            mode = ?mode,
            "certwatch service started"
        );

        Ok(Self {
            engine,
            rescan,
            mode,
            shutdown_tx,
            handles,
        })
    }

    /// Handle for requesting a manual full rescan.
    pub fn rescan_handle(&self) -> RescanHandle {
        self.rescan.clone()
    }

    pub const fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub const fn mode(&self) -> ServiceMode {
        self.mode
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(self) {
        info!("stopping certwatch service");
        let _ = self.shutdown_tx.send(());
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "service task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{simple_cert, write_archive};
    use certwatch_core::ArchiveName;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn wait_for_records(index: &IndexStore, name: &ArchiveName, n: usize) -> bool {
        for _ in 0..100 {
            if index.archive(name).unwrap().len() == n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_initial_scan_indexes_existing_archives() {
        let dir = TempDir::new().unwrap();
        let a = simple_cert("a.example.com");
        write_archive(dir.path(), "web", &[("certs/a.crt", &a.der)]);

        let config = SyncConfig {
            archive_dir: dir.path().to_path_buf(),
            database_path: dir.path().join("index.db"),
            ..SyncConfig::default()
        };
        let service = CertWatchService::start(config).await.unwrap();
        assert_eq!(service.mode(), ServiceMode::Full);

        let name = ArchiveName::parse("web").unwrap();
        assert!(wait_for_records(service.engine().index(), &name, 1).await);
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_dir_fails_by_default() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig {
            archive_dir: dir.path().join("absent"),
            ..SyncConfig::default()
        };
        let index = Arc::new(IndexStore::in_memory().unwrap());
        assert!(matches!(
            CertWatchService::start_with_index(config, index),
            Err(SyncError::MissingDirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_dir_scheduler_only() {
        let dir = TempDir::new().unwrap();
        let archive_dir = dir.path().join("later");
        let config = SyncConfig {
            archive_dir: archive_dir.clone(),
            missing_dir: MissingDirPolicy::SchedulerOnly,
            ..SyncConfig::default()
        };
        let index = Arc::new(IndexStore::in_memory().unwrap());
        let service = CertWatchService::start_with_index(config, Arc::clone(&index)).unwrap();
        assert_eq!(service.mode(), ServiceMode::SchedulerOnly);

        std::fs::create_dir(&archive_dir).unwrap();
        let a = simple_cert("a.example.com");
        write_archive(&archive_dir, "web", &[("certs/a.crt", &a.der)]);
        assert!(service.rescan_handle().trigger());

        let name = ArchiveName::parse("web").unwrap();
        assert!(wait_for_records(&index, &name, 1).await);
        service.shutdown().await;
    }
}
