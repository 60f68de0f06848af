//! Command implementations.

pub mod export;
pub mod fetch;
pub mod list;
pub mod rescan;
pub mod run;
pub mod show;
pub mod stats;

use std::sync::Arc;

use certwatch_sync::{IndexStore, SyncConfig};

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration (file, environment, flags)
    pub config: SyncConfig,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Open the index named by the configuration.
    pub async fn open_index(&self) -> anyhow::Result<Arc<IndexStore>> {
        let path = self.config.database_path.clone();
        let index = tokio::task::spawn_blocking(move || IndexStore::open(path)).await??;
        Ok(Arc::new(index))
    }

    /// Run a read against the index off the async runtime.
    pub async fn with_index<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&IndexStore) -> certwatch_sync::Result<T> + Send + 'static,
    {
        let index = self.open_index().await?;
        let value = tokio::task::spawn_blocking(move || f(index.as_ref())).await??;
        Ok(value)
    }
}
