//! `certwatch fetch` - Copy a raw archive out of the archive directory.

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use certwatch_core::ArchiveName;

use super::Context;
use crate::cli::args::FetchArgs;

pub async fn execute(ctx: Context, args: FetchArgs) -> Result<()> {
    let name = ArchiveName::parse_requested(args.archive)?;
    let target = copy_archive(&ctx.config.archive_dir, &name, &args.dest).await?;
    println!("{} {}", "Saved".green(), target.display());
    Ok(())
}

/// Copy `<name>.tar.gz` from `archive_dir` into `dest`. The name has
/// already been validated, so the source cannot leave `archive_dir`.
async fn copy_archive(archive_dir: &Path, name: &ArchiveName, dest: &Path) -> Result<PathBuf> {
    let source = name.path_in(archive_dir);
    if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
        bail!("archive not found: {}", source.display());
    }

    tokio::fs::create_dir_all(dest)
        .await
        .with_context(|| format!("creating {}", dest.display()))?;
    let target = dest.join(name.file_name());
    tokio::fs::copy(&source, &target)
        .await
        .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
    Ok(target)
}
