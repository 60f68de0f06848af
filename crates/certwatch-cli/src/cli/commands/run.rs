//! `certwatch run` - Keep the index in step with the archive directory.

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use certwatch_sync::{CertWatchService, RescanHandle, ServiceMode};

use super::Context;

pub async fn execute(ctx: Context) -> Result<()> {
    let service = CertWatchService::start(ctx.config.clone()).await?;

    eprintln!(
        "{} {} -> {}",
        "Watching".bold(),
        ctx.config.archive_dir.display().to_string().cyan(),
        ctx.config.database_path.display()
    );
    if service.mode() == ServiceMode::SchedulerOnly {
        eprintln!(
            "{}",
            "Archive directory is missing; relying on periodic rescans until it appears".yellow()
        );
    }

    wait_for_shutdown(service.rescan_handle()).await?;
    info!("shutdown requested");
    service.shutdown().await;
    Ok(())
}

/// Wait for Ctrl-C; SIGHUP requests a rescan meanwhile.
#[cfg(unix)]
async fn wait_for_shutdown(rescan: RescanHandle) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => return res.map_err(Into::into),
            _ = terminate.recv() => return Ok(()),
            _ = hangup.recv() => {
                info!("SIGHUP received, requesting rescan");
                if !rescan.trigger() {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_rescan: RescanHandle) -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
