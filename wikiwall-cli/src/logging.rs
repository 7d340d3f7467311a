//! Log setup: optional stderr output plus a warnings-and-up log file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Size at which the log file is rotated (10 MiB).
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Install the global subscriber.
///
/// Console output goes to stderr: `info` and up with `--debug`, otherwise only
/// what `RUST_LOG` asks for. Warnings and errors always go to `log_path`.
/// If the log file cannot be opened, console logging is still installed and
/// the error is returned.
pub fn init(debug: bool, log_path: &Path) -> Result<()> {
    let default_directive = if debug { "info" } else { "off" };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file = open_log_file(log_path);
    let file_layer = file.as_ref().ok().map(|file| {
        fmt::layer()
            .with_writer(Arc::clone(file))
            .with_ansi(false)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    file.map(|_| ())
}

/// Open `path` for appending, rotating it to `<path>.1` once it grows too large.
fn open_log_file(path: &Path) -> Result<Arc<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    if fs::metadata(path).map(|m| m.len() > MAX_LOG_BYTES).unwrap_or(false) {
        fs::rename(path, backup_path(path))
            .with_context(|| format!("Failed to rotate {}", path.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
    Ok(Arc::new(file))
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}
