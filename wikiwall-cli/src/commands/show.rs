//! Show command: reveal the download directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;
use wikiwall_core::{wallpaper, WikiwallConfig};

/// Execute the show command.
pub fn execute(config: WikiwallConfig, dest: Option<PathBuf>) -> Result<()> {
    let dir = dest.unwrap_or(config.dest_dir);

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    debug!(dir = %dir.display(), "Opening download directory");
    wallpaper::reveal(&dir).with_context(|| format!("Failed to open {}", dir.display()))?;

    println!("{} {}", "Opened".green(), dir.display());
    Ok(())
}
