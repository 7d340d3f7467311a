//! One wikiwall run: scrape, pick, download, record, clean, set background.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{error, info, instrument, warn};

use crate::config::WikiwallConfig;
use crate::download::{ArtifactDownloader, HttpDownloader, Progress};
use crate::error::{Result, WikiwallError};
use crate::retention::{RetentionCleaner, RetentionPolicy};
use crate::sampler::sample_one;
use crate::http_client::HttpClient;
use crate::scrape::{Candidate, CandidateSource, WikiArtScraper};
use crate::seen::SeenStore;
use crate::wallpaper::{AppleScriptBackground, DesktopBackground};

/// What a successful run did.
#[derive(Debug)]
pub struct RunOutcome {
    pub candidate: Candidate,
    pub image: PathBuf,
    /// Artifacts evicted, `None` when no limit is configured.
    pub removed: Option<usize>,
}

/// Wires the collaborators of a run together.
pub struct Wikiwall<S, D, B> {
    config: WikiwallConfig,
    source: S,
    downloader: D,
    background: B,
}

impl<S, D, B> Wikiwall<S, D, B>
where
    S: CandidateSource,
    D: ArtifactDownloader,
    B: DesktopBackground,
{
    pub fn new(config: WikiwallConfig, source: S, downloader: D, background: B) -> Self {
        Self {
            config,
            source,
            downloader,
            background,
        }
    }

    pub fn config(&self) -> &WikiwallConfig {
        &self.config
    }

    /// Execute a full run.
    ///
    /// The download history is held open only for the duration of this call.
    /// If it cannot be opened the run continues without duplicate detection.
    #[instrument(level = "info", skip_all, fields(dest = %self.config.dest_dir.display()))]
    pub async fn run(&self, progress: Progress<'_>) -> Result<RunOutcome> {
        let store = match SeenStore::open(self.config.db_path()) {
            Ok(store) => Some(store),
            Err(e) => {
                error!(error = %e, "Download history unavailable, duplicates will not be detected");
                None
            }
        };

        let (candidate, image) = self.fetch_new_image(store.as_ref(), progress).await?;

        if let Some(store) = store {
            match store.add(candidate.as_str()) {
                Ok(()) => {}
                Err(WikiwallError::Duplicate(url)) => warn!(url, "Already recorded"),
                Err(e) => error!(error = %e, "Failed to record download"),
            }
            if let Err(e) = store.close() {
                warn!(error = %e, "Failed to close download history");
            }
        }

        let background = self.background.set_background(&image);
        let removed = self.clean()?;
        background?;

        Ok(RunOutcome {
            candidate,
            image,
            removed,
        })
    }

    /// Pick and download an image that has not been downloaded before.
    ///
    /// Moves on to later pages while every candidate on a page is already known.
    async fn fetch_new_image(
        &self,
        store: Option<&SeenStore>,
        progress: Progress<'_>,
    ) -> Result<(Candidate, PathBuf)> {
        let pages = if self.source.is_paged() {
            self.config.max_pages.max(1)
        } else {
            1
        };
        let mut skipped: HashSet<Candidate> = HashSet::new();

        for page_number in 1..=pages {
            let page = self.source.fetch_page(page_number).await?;

            loop {
                let fresh = page
                    .candidates()
                    .filter(|c| !skipped.contains(c) && !is_seen(store, c));
                let Some(candidate) = sample_one(fresh) else {
                    break;
                };

                info!(url = %candidate, "Selected image");
                match self
                    .downloader
                    .download(&candidate, &self.config.dest_dir, &mut *progress)
                    .await
                {
                    Ok(image) => return Ok((candidate, image)),
                    Err(WikiwallError::AlreadyExists(path)) => {
                        warn!(path = %path.display(), "Image already present, picking another");
                        if let Some(store) = store {
                            if let Err(e) = store.add(candidate.as_str()) {
                                warn!(error = %e, "Failed to record existing image");
                            }
                        }
                        skipped.insert(candidate);
                    }
                    Err(e) => return Err(e),
                }
            }

            info!(page = page_number, "No new images on page");
            if page_number < pages {
                tokio::time::sleep(self.config.duplicate_wait).await;
            }
        }

        Err(WikiwallError::Scrape(format!(
            "No new images found after {pages} page(s)"
        )))
    }

    /// Apply the retention policy to the download directory.
    ///
    /// Partial cleanup failures are logged and do not fail the run.
    fn clean(&self) -> Result<Option<usize>> {
        let limit = match self.config.retention {
            RetentionPolicy::Unlimited => {
                info!("No download limit set. Skipping cleaning.");
                return Ok(None);
            }
            RetentionPolicy::Keep(limit) => limit,
        };

        info!(%limit, "Download limit set");
        let cleaner = RetentionCleaner::new(&self.config.dest_dir);
        match cleaner.enforce(limit) {
            Ok(removed) => Ok(Some(removed)),
            Err(WikiwallError::PartialCleanup { removed, failures }) => {
                for failure in &failures {
                    warn!(failure = %failure, "Could not remove old download");
                }
                Ok(Some(removed))
            }
            Err(e) => Err(e),
        }
    }
}

impl Wikiwall<WikiArtScraper, HttpDownloader, AppleScriptBackground> {
    /// A run against the WikiArt site and the macOS desktop.
    pub fn live(config: WikiwallConfig) -> Result<Self> {
        let scraper = WikiArtScraper::new(
            HttpClient::new(config.http_config())?,
            config.source_url.clone(),
            config.scrape_mode,
        );
        let downloader = HttpDownloader::new(HttpClient::new(config.http_config())?);
        Ok(Self::new(config, scraper, downloader, AppleScriptBackground))
    }
}

fn is_seen(store: Option<&SeenStore>, candidate: &Candidate) -> bool {
    let Some(store) = store else {
        return false;
    };
    match store.contains(candidate.as_str()) {
        Ok(seen) => seen,
        Err(e) => {
            error!(error = %e, "Duplicate check failed");
            false
        }
    }
}
