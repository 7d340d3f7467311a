use std::path::PathBuf;

use thiserror::Error;

/// A single artifact that could not be removed during retention enforcement.
#[derive(Debug)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl std::fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

#[derive(Error, Debug)]
pub enum WikiwallError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already downloaded: {0}")]
    Duplicate(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Cleanup removed {removed} artifact(s) but {} deletion(s) failed", .failures.len())]
    PartialCleanup {
        removed: usize,
        failures: Vec<CleanupFailure>,
    },

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wallpaper error: {0}")]
    Wallpaper(String),
}

pub type Result<T> = std::result::Result<T, WikiwallError>;
