//! Bounded download directory with oldest-first eviction.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::error::{CleanupFailure, Result, WikiwallError};

/// File extensions treated as downloaded artifacts (compared case-insensitively).
pub const ARTIFACT_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Maximum number of artifacts to keep. Always non-negative and integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetentionLimit(usize);

impl RetentionLimit {
    pub fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RetentionLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for RetentionLimit {
    type Error = WikiwallError;

    fn try_from(value: usize) -> Result<Self> {
        Ok(Self(value))
    }
}

impl TryFrom<i64> for RetentionLimit {
    type Error = WikiwallError;

    fn try_from(value: i64) -> Result<Self> {
        usize::try_from(value).map(Self).map_err(|_| {
            WikiwallError::InvalidArgument(format!(
                "limit must be a non-negative integer, got {value}"
            ))
        })
    }
}

impl TryFrom<i32> for RetentionLimit {
    type Error = WikiwallError;

    fn try_from(value: i32) -> Result<Self> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<f64> for RetentionLimit {
    type Error = WikiwallError;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > usize::MAX as f64 {
            return Err(WikiwallError::InvalidArgument(format!(
                "limit must be a non-negative integer, got {value}"
            )));
        }
        Ok(Self(value as usize))
    }
}

/// What to do with the download directory after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Never delete anything.
    Unlimited,
    /// Keep at most this many artifacts.
    Keep(RetentionLimit),
}

impl RetentionPolicy {
    /// Flag value meaning "no limit".
    pub const UNLIMITED_FLAG: i64 = -1;

    /// Interpret a command-line limit, where `-1` disables cleaning.
    pub fn from_flag(value: i64) -> Result<Self> {
        if value == Self::UNLIMITED_FLAG {
            Ok(Self::Unlimited)
        } else {
            RetentionLimit::try_from(value).map(Self::Keep)
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::Keep(RetentionLimit(10))
    }
}

/// Filesystem operations needed to enforce a retention limit.
pub trait ArtifactFs {
    /// Regular files directly inside `dir`.
    fn list(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>>;

    /// Last modification time of `path`.
    fn modified(&self, path: &Path) -> std::io::Result<SystemTime>;

    fn remove(&self, path: &Path) -> std::io::Result<()>;
}

/// [`ArtifactFs`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ArtifactFs for LocalFs {
    fn list(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn remove(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Whether `path` follows the artifact naming convention.
pub fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ARTIFACT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Enforces a maximum artifact count on one directory.
pub struct RetentionCleaner<F = LocalFs> {
    dir: PathBuf,
    fs: F,
}

impl RetentionCleaner<LocalFs> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_fs(dir, LocalFs)
    }
}

impl<F: ArtifactFs> RetentionCleaner<F> {
    pub fn with_fs(dir: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            dir: dir.into(),
            fs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifacts in the directory, oldest first.
    ///
    /// Artifacts whose modification time cannot be read sort before all others.
    pub fn artifacts(&self) -> Result<Vec<PathBuf>> {
        let mut dated: Vec<(Option<SystemTime>, PathBuf)> = self
            .fs
            .list(&self.dir)?
            .into_iter()
            .filter(|path| is_artifact(path))
            .map(|path| {
                let modified = match self.fs.modified(&path) {
                    Ok(time) => Some(time),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Could not read modification time");
                        None
                    }
                };
                (modified, path)
            })
            .collect();

        dated.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(dated.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete the oldest artifacts until at most `limit` remain.
    ///
    /// Returns the number of artifacts removed. If some deletions fail, the
    /// rest are still attempted and [`WikiwallError::PartialCleanup`] reports
    /// every failure.
    pub fn enforce_limit<L>(&self, limit: L) -> Result<usize>
    where
        L: TryInto<RetentionLimit, Error = WikiwallError>,
    {
        self.enforce(limit.try_into()?)
    }

    /// [`enforce_limit`](Self::enforce_limit) for an already validated limit.
    pub fn enforce(&self, limit: RetentionLimit) -> Result<usize> {
        let limit = limit.get();
        let artifacts = self.artifacts()?;

        if artifacts.len() <= limit {
            debug!(count = artifacts.len(), limit, "Download limit not exceeded");
            return Ok(0);
        }

        info!(
            count = artifacts.len(),
            dir = %self.dir.display(),
            limit,
            "Cleaning download directory"
        );

        let surplus = artifacts.len() - limit;
        let mut removed = 0;
        let mut failures = Vec::new();

        for path in artifacts.into_iter().take(surplus) {
            match self.fs.remove(&path) {
                Ok(()) => {
                    removed += 1;
                    info!(path = %path.display(), "Removed");
                }
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "Failed to remove");
                    failures.push(CleanupFailure { path, source });
                }
            }
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(WikiwallError::PartialCleanup { removed, failures })
        }
    }
}
