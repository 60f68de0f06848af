//! Periodic and on-demand full rescans.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::engine::SyncEngine;

/// Requests a manual rescan from a running [`RescanScheduler`].
#[derive(Debug, Clone)]
pub struct RescanHandle {
    tx: mpsc::Sender<()>,
}

impl RescanHandle {
    /// Ask for a rescan. Triggers coalesce while one is already pending.
    ///
    /// Returns false once the scheduler has stopped.
    pub fn trigger(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Runs [`SyncEngine::rescan_all`] on a fixed interval and on request.
pub struct RescanScheduler {
    engine: Arc<SyncEngine>,
    period: Duration,
    trigger_rx: mpsc::Receiver<()>,
}

impl RescanScheduler {
    pub fn new(engine: Arc<SyncEngine>, period: Duration) -> (Self, RescanHandle) {
        let (tx, trigger_rx) = mpsc::channel(1);
        (
            Self {
                engine,
                period,
                trigger_rx,
            },
            RescanHandle { tx },
        )
    }

    /// Run until shutdown. The first periodic rescan fires one full period
    /// after start.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.rescan("interval").await,
                Some(()) = self.trigger_rx.recv() => self.rescan("manual").await,
                _ = shutdown.recv() => {
                    info!("rescan scheduler shutting down");
                    break;
                }
            }
        }
    }

    async fn rescan(&self, reason: &'static str) {
        info!(reason, "rescan started");
        if let Err(e) = self.engine.rescan_all().await {
            warn!(reason, error = %e, "rescan failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::index::IndexStore;
    use crate::testutil::{simple_cert, write_archive};
    use certwatch_core::ArchiveName;
    use tempfile::TempDir;

    fn engine_for(dir: &std::path::Path) -> Arc<SyncEngine> {
        let config = SyncConfig {
            archive_dir: dir.to_path_buf(),
            ..SyncConfig::default()
        };
        Arc::new(SyncEngine::new(
            Arc::new(IndexStore::in_memory().unwrap()),
            &config,
        ))
    }

    #[tokio::test]
    async fn test_trigger_runs_rescan() {
        let dir = TempDir::new().unwrap();
        let a = simple_cert("a.example.com");
        write_archive(dir.path(), "web", &[("certs/a.crt", &a.der)]);
        let engine = engine_for(dir.path());

        let (scheduler, handle) =
            RescanScheduler::new(Arc::clone(&engine), Duration::from_secs(3600));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(scheduler.run(shutdown_rx));

        assert!(handle.trigger());
        let name = ArchiveName::parse("web").unwrap();
        let mut indexed = false;
        for _ in 0..100 {
            if !engine.index().archive(&name).unwrap().is_empty() {
                indexed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(indexed);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
        assert!(!handle.trigger());
    }

    #[tokio::test]
    async fn test_triggers_coalesce() {
        let dir = TempDir::new().unwrap();
        let (_scheduler, handle) =
            RescanScheduler::new(engine_for(dir.path()), Duration::from_secs(3600));
        assert!(handle.trigger());
        assert!(handle.trigger());
        assert!(handle.trigger());
    }
}
