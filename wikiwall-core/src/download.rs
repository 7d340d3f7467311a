//! Streaming image downloads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, WikiwallError};
use crate::http_client::HttpClient;
use crate::scrape::Candidate;

/// Suffix of a file still being written.
const PARTIAL_SUFFIX: &str = "part";

/// Receives `(file_name, bytes_so_far, total_bytes)` as a download progresses.
pub type Progress<'a> = &'a mut (dyn FnMut(&str, u64, Option<u64>) + Send);

/// Retrieves a candidate into a destination directory.
#[async_trait]
pub trait ArtifactDownloader: Send + Sync {
    /// Download `candidate` into `dest`, returning the final file path.
    async fn download(
        &self,
        candidate: &Candidate,
        dest: &Path,
        progress: Progress<'_>,
    ) -> Result<PathBuf>;
}

/// File name for a candidate: the last path segment of its URL.
pub fn file_name_for(candidate: &Candidate) -> Result<String> {
    let url = candidate.as_str();
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");

    if name.is_empty() || name == "." || name == ".." || !path.contains("://") {
        return Err(WikiwallError::InvalidArgument(format!(
            "cannot derive a file name from {url}"
        )));
    }
    Ok(name.to_string())
}

/// Delete `*.part` files left in `dest` by interrupted downloads.
///
/// Returns how many were removed. Files that cannot be removed are logged and
/// skipped.
pub async fn remove_stale_partials(dest: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(dest).await?;
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_partial = path
            .extension()
            .is_some_and(|ext| ext == PARTIAL_SUFFIX);
        if !is_partial || !entry.file_type().await?.is_file() {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                removed += 1;
                debug!(path = %path.display(), "Removed stale partial download");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale partial download"),
        }
    }

    Ok(removed)
}

/// Downloads over HTTP, writing to `<name>.part` and renaming on completion.
pub struct HttpDownloader {
    http: HttpClient,
}

impl HttpDownloader {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ArtifactDownloader for HttpDownloader {
    #[instrument(level = "info", skip(self, progress), fields(url = %candidate))]
    async fn download(
        &self,
        candidate: &Candidate,
        dest: &Path,
        progress: Progress<'_>,
    ) -> Result<PathBuf> {
        let name = file_name_for(candidate)?;
        tokio::fs::create_dir_all(dest).await?;
        remove_stale_partials(dest).await?;

        let path = dest.join(&name);
        if tokio::fs::try_exists(&path).await? {
            return Err(WikiwallError::AlreadyExists(path));
        }
        let partial = dest.join(format!("{name}.{PARTIAL_SUFFIX}"));

        let mut response = self.http.get(candidate.as_str()).await?;
        let total = response.content_length();
        debug!(total_bytes = ?total, "Starting download");

        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written = 0u64;

        let streamed = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
                progress(&name, written, total);
            }
            file.flush().await?;
            Ok::<(), WikiwallError>(())
        }
        .await;

        if let Err(e) = streamed {
            drop(file);
            if let Err(rm) = tokio::fs::remove_file(&partial).await {
                warn!(path = %partial.display(), error = %rm, "Failed to remove partial download");
            }
            return Err(e);
        }
        drop(file);

        tokio::fs::rename(&partial, &path).await?;
        info!(path = %path.display(), bytes = written, "Downloaded");
        Ok(path)
    }
}
