//! Wikiwall Core - random artwork wallpapers with bounded local history.
//!
//! This crate holds everything behind the `wikiwall` command:
//!
//! - [`sampler`]: single-pass uniform selection from scraped candidates
//! - [`seen`]: persistent download history used to skip duplicates
//! - [`retention`]: oldest-first eviction keeping the download directory bounded
//! - [`scrape`], [`download`], [`wallpaper`]: the I/O collaborators
//! - [`flow`]: the run that ties them together
//!
//! # Example
//!
//! ```no_run
//! use wikiwall_core::{RetentionCleaner, SeenStore};
//!
//! # fn example() -> wikiwall_core::Result<()> {
//! let store = SeenStore::open("/tmp/wikiwall/wikiwall.db")?;
//! if !store.contains("https://uploads.wikiart.org/a.jpg")? {
//!     store.add("https://uploads.wikiart.org/a.jpg")?;
//! }
//!
//! let removed = RetentionCleaner::new("/tmp/wikiwall").enforce_limit(10i64)?;
//! println!("removed {removed} old image(s)");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod flow;
pub mod http_client;
pub mod retention;
pub mod sampler;
pub mod scrape;
pub mod seen;
pub mod wallpaper;

// Re-export main types for convenience
pub use config::WikiwallConfig;
pub use download::{ArtifactDownloader, HttpDownloader, Progress};
pub use error::{CleanupFailure, Result, WikiwallError};
pub use flow::{RunOutcome, Wikiwall};
pub use http_client::{HttpClient, HttpConfig};
pub use retention::{ArtifactFs, LocalFs, RetentionCleaner, RetentionLimit, RetentionPolicy};
pub use sampler::{sample, sample_one, Sample};
pub use scrape::{Candidate, CandidateSource, ScrapeMode, ScrapedPage, WikiArtScraper};
pub use seen::SeenStore;
pub use wallpaper::{AppleScriptBackground, DesktopBackground};
