//! Runtime configuration.
//!
//! Loaded once from the environment and passed explicitly to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http_client::HttpConfig;
use crate::retention::RetentionPolicy;
use crate::scrape::ScrapeMode;
use crate::seen::DB_FILENAME;

/// Application directory name under the XDG data home.
pub const APP_NAME: &str = "wikiwall";

/// Log file name inside the data directory.
pub const LOG_FILENAME: &str = "wikiwall.log";

/// WikiArt high-resolution listing, one JSON page per `{}`.
pub const DEFAULT_JSON_SOURCE: &str =
    "https://www.wikiart.org/?json=2&layout=new&param=high_resolution&layout=new&page={}";

/// WikiArt high-resolution HTML page.
pub const DEFAULT_HTML_SOURCE: &str = "https://www.wikiart.org/en/high-resolution-artworks";

#[derive(Debug, Clone)]
pub struct WikiwallConfig {
    /// Holds the download history database and the log file.
    pub data_dir: PathBuf,
    /// Where images are downloaded (default: `data_dir`).
    pub dest_dir: PathBuf,
    /// Cleanup applied after each download.
    pub retention: RetentionPolicy,
    /// Listing URL; `{}` is replaced by the page number in JSON mode.
    pub source_url: String,
    pub scrape_mode: ScrapeMode,
    /// Pages to try when every candidate on a page was already downloaded.
    pub max_pages: u32,
    /// Pause before requesting the next page after an all-duplicate page.
    pub duplicate_wait: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Retries after the first request for transient HTTP failures.
    pub max_retries: u32,
}

impl Default for WikiwallConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            dest_dir: data_dir.clone(),
            data_dir,
            retention: RetentionPolicy::default(),
            source_url: DEFAULT_JSON_SOURCE.to_string(),
            scrape_mode: ScrapeMode::Json,
            max_pages: 5,
            duplicate_wait: Duration::from_secs(3),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl WikiwallConfig {
    /// Load configuration from environment variables.
    ///
    /// - `XDG_DATA_HOME` / `HOME`: base of the data directory
    /// - `WIKIWALL_SOURCE_URL`: listing URL override
    /// - `WIKIWALL_SCRAPE_MODE`: `json` (default) or `html`
    /// - `WIKIWALL_MAX_PAGES`, `WIKIWALL_TIMEOUT_SECS`, `WIKIWALL_MAX_RETRIES`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let scrape_mode = std::env::var("WIKIWALL_SCRAPE_MODE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.scrape_mode);

        let source_url = std::env::var("WIKIWALL_SOURCE_URL").unwrap_or_else(|_| match scrape_mode {
            ScrapeMode::Json => DEFAULT_JSON_SOURCE.to_string(),
            ScrapeMode::Html => DEFAULT_HTML_SOURCE.to_string(),
        });

        let max_pages = std::env::var("WIKIWALL_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_pages);

        let timeout = std::env::var("WIKIWALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_retries = std::env::var("WIKIWALL_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_retries);

        Self {
            source_url,
            scrape_mode,
            max_pages,
            timeout,
            max_retries,
            ..defaults
        }
    }

    /// Rooted at `data_dir`, downloading into it as well.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            dest_dir: data_dir.clone(),
            data_dir,
            ..Self::default()
        }
    }

    /// HTTP settings derived from this configuration.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: self.timeout,
            max_retries: self.max_retries,
            ..Default::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILENAME)
    }
}

/// `$XDG_DATA_HOME/wikiwall`, falling back to `~/.local/share/wikiwall`.
pub fn default_data_dir() -> PathBuf {
    data_dir_from(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn data_dir_from(xdg_data_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg_data_home
        .filter(|p| p.is_absolute())
        .unwrap_or_else(|| {
            home.unwrap_or_else(|| PathBuf::from("."))
                .join(Path::new(".local").join("share"))
        });
    base.join(APP_NAME)
}
