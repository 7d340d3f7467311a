//! Default command: fetch a new image and make it the desktop background.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;
use wikiwall_core::{RetentionPolicy, Wikiwall, WikiwallConfig};

use crate::utils::ProgressLine;
use crate::RunArgs;

/// Execute a run.
pub async fn execute(mut config: WikiwallConfig, args: RunArgs) -> Result<()> {
    if args.debug {
        println!("Debug mode is on.");
    }

    if let Some(dest) = args.dest {
        info!(dest = %dest.display(), "Destination set");
        config.dest_dir = dest;
    }

    config.retention = RetentionPolicy::from_flag(args.limit)
        .with_context(|| format!("Invalid --limit value: {}", args.limit))?;

    let app = Wikiwall::live(config).context("Failed to create HTTP client")?;

    println!("Searching for image...");
    let mut progress = ProgressLine::new(false);
    let outcome = app
        .run(&mut |name, done, total| progress.update(name, done, total))
        .await;
    progress.finish();
    let outcome = outcome.context("Failed to set a new desktop background")?;

    println!();
    println!("{}", "Desktop background set!".green().bold());
    println!();
    println!("   {} {}", "Image:".dimmed(), outcome.image.display());
    println!("   {} {}", "Source:".dimmed(), outcome.candidate);
    if let Some(removed) = outcome.removed.filter(|&n| n > 0) {
        println!("   {} {}", "Old images removed:".dimmed(), removed);
    }

    Ok(())
}
