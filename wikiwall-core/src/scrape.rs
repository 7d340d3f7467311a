//! Candidate image URLs scraped from WikiArt.
//!
//! Two listing formats are understood:
//!
//! - **JSON**: paged listing (`…&page={}`) whose `Paintings[].image` fields
//!   hold image URLs.
//! - **HTML**: the single high-resolution artworks page, where `.jpg` URLs
//!   are embedded inside the `artworks-by-dictionary` block.
//!
//! Either way the result is a [`ScrapedPage`] whose candidates are produced
//! lazily, front to back, and cannot be restarted once consumed.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, WikiwallError};
use crate::http_client::HttpClient;

/// Marker of the HTML block holding the artwork links.
const HTML_BLOCK_MARKER: &str = "artworks-by-dictionary";

/// Identifier of one downloadable image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Candidate {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Listing format served at the source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrapeMode {
    #[default]
    Json,
    Html,
}

impl std::str::FromStr for ScrapeMode {
    type Err = WikiwallError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            other => Err(WikiwallError::InvalidArgument(format!(
                "unknown scrape mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(rename = "Paintings", default)]
    paintings: Option<Vec<Painting>>,
}

#[derive(Debug, Deserialize)]
struct Painting {
    #[serde(default)]
    image: Option<String>,
}

/// One fetched listing page.
#[derive(Debug)]
pub enum ScrapedPage {
    /// Image URLs decoded from a JSON listing.
    Listing(Vec<String>),
    /// Raw HTML, scanned for image URLs on demand.
    Html(String),
}

impl ScrapedPage {
    /// Parse a JSON listing body.
    pub fn from_json(body: &str) -> Result<Self> {
        let listing: ListingResponse = serde_json::from_str(body)
            .map_err(|e| WikiwallError::Scrape(format!("Failed to parse listing: {e}")))?;

        let urls = listing
            .paintings
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.image)
            .filter(|url| !url.is_empty())
            .collect();
        Ok(Self::Listing(urls))
    }

    pub fn from_html(body: impl Into<String>) -> Self {
        Self::Html(body.into())
    }

    /// Candidates on this page, in document order.
    pub fn candidates(&self) -> Box<dyn Iterator<Item = Candidate> + '_> {
        match self {
            Self::Listing(urls) => Box::new(urls.iter().map(|url| Candidate::new(url.as_str()))),
            Self::Html(body) => Box::new(
                jpg_url_regex()
                    .find_iter(artworks_block(body))
                    .map(|m| Candidate::new(m.as_str())),
            ),
        }
    }
}

/// The `<div>` element carrying [`HTML_BLOCK_MARKER`], up to its matching
/// `</div>`. Empty if the marker is absent; runs to the end of the document if
/// the element is never closed.
fn artworks_block(body: &str) -> &str {
    let Some(marker) = body.find(HTML_BLOCK_MARKER) else {
        return "";
    };
    let start = body[..marker].rfind("<div").unwrap_or(marker);

    let mut depth = 0usize;
    let mut pos = start;
    loop {
        let rest = &body[pos..];
        match (rest.find("<div"), rest.find("</div")) {
            (Some(open), Some(close)) if open < close => {
                depth += 1;
                pos += open + "<div".len();
            }
            (_, Some(close)) => {
                pos += close;
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &body[start..pos];
                }
                pos += "</div".len();
            }
            _ => return &body[start..],
        }
    }
}

fn jpg_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s\x22'<>]+?\.jpg").expect("valid regex"))
}

/// Produces pages of download candidates.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch listing page `page` (1-based).
    async fn fetch_page(&self, page: u32) -> Result<ScrapedPage>;

    /// Whether pages beyond the first exist.
    fn is_paged(&self) -> bool;
}

/// Scrapes WikiArt over HTTP.
pub struct WikiArtScraper {
    http: HttpClient,
    source_url: String,
    mode: ScrapeMode,
}

impl WikiArtScraper {
    pub fn new(http: HttpClient, source_url: impl Into<String>, mode: ScrapeMode) -> Self {
        Self {
            http,
            source_url: source_url.into(),
            mode,
        }
    }

    fn page_url(&self, page: u32) -> String {
        self.source_url.replace("{}", &page.to_string())
    }
}

#[async_trait]
impl CandidateSource for WikiArtScraper {
    #[instrument(level = "info", skip(self), fields(mode = ?self.mode))]
    async fn fetch_page(&self, page: u32) -> Result<ScrapedPage> {
        let url = self.page_url(page);
        debug!(url = %url, "Fetching listing");

        let body = self.http.get_text(&url).await?;
        let scraped = match self.mode {
            ScrapeMode::Json => ScrapedPage::from_json(&body)?,
            ScrapeMode::Html => ScrapedPage::from_html(body),
        };

        info!(page, "Fetched listing page");
        Ok(scraped)
    }

    fn is_paged(&self) -> bool {
        self.mode == ScrapeMode::Json && self.source_url.contains("{}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(page: &ScrapedPage) -> Vec<String> {
        page.candidates().map(Candidate::into_string).collect()
    }

    #[test]
    fn test_json_listing_yields_images() {
        let body = r#"{
            "Paintings": [
                {"title": "One", "image": "https://uploads.wikiart.org/a/one.jpg"},
                {"title": "No image"},
                {"title": "Two", "image": "https://uploads.wikiart.org/b/two.jpg"}
            ],
            "PageSize": 3
        }"#;

        let page = ScrapedPage::from_json(body).unwrap();
        assert_eq!(
            urls(&page),
            vec![
                "https://uploads.wikiart.org/a/one.jpg",
                "https://uploads.wikiart.org/b/two.jpg"
            ]
        );
    }

    #[test]
    fn test_json_listing_without_paintings_is_empty() {
        let page = ScrapedPage::from_json(r#"{"Paintings": null}"#).unwrap();
        assert_eq!(page.candidates().count(), 0);
    }

    #[test]
    fn test_malformed_json_is_scrape_error() {
        assert!(matches!(
            ScrapedPage::from_json("<html></html>"),
            Err(WikiwallError::Scrape(_))
        ));
    }

    #[test]
    fn test_html_block_yields_jpg_urls() {
        let body = r#"
            <img src="http://s.com/logo.jpg">
            <div class="artworks-by-dictionary">http://s.com/fake1.jpg http://s.com/fake2.jpg</div>
        "#;
        let page = ScrapedPage::from_html(body);
        assert_eq!(urls(&page), vec!["http://s.com/fake1.jpg", "http://s.com/fake2.jpg"]);
    }

    #[test]
    fn test_html_stops_at_end_of_block() {
        let body = r#"<div class="artworks-by-dictionary">http://a/1.jpg</div><footer><img src="http://s/logo.jpg"></footer>"#;
        assert_eq!(urls(&ScrapedPage::from_html(body)), vec!["http://a/1.jpg"]);
    }

    #[test]
    fn test_html_block_with_nested_divs() {
        let body = r#"
            <div id="main">
              <div class="artworks-by-dictionary">
                <div class="item">http://a/1.jpg</div>
                <div class="item"><div>http://a/2.jpg</div></div>
              </div>
              <div class="sidebar">http://s/ad.jpg</div>
            </div>
            <img src="http://s/logo.jpg">
        "#;
        assert_eq!(
            urls(&ScrapedPage::from_html(body)),
            vec!["http://a/1.jpg", "http://a/2.jpg"]
        );
    }

    #[test]
    fn test_unclosed_block_runs_to_end() {
        let body = r#"<div class="artworks-by-dictionary">http://a/1.jpg http://a/2.jpg"#;
        assert_eq!(
            urls(&ScrapedPage::from_html(body)),
            vec!["http://a/1.jpg", "http://a/2.jpg"]
        );
    }

    #[test]
    fn test_html_without_block_is_empty() {
        let page = ScrapedPage::from_html("<html><img src=\"http://s.com/x.jpg\"></html>");
        assert_eq!(page.candidates().count(), 0);
    }

    #[test]
    fn test_scrape_mode_parsing() {
        assert_eq!("json".parse::<ScrapeMode>().unwrap(), ScrapeMode::Json);
        assert_eq!("HTML".parse::<ScrapeMode>().unwrap(), ScrapeMode::Html);
        assert!("xml".parse::<ScrapeMode>().is_err());
    }

    #[test]
    fn test_page_url_substitution() {
        let http = HttpClient::new(Default::default()).unwrap();
        let scraper = WikiArtScraper::new(http, "https://x.org/?page={}", ScrapeMode::Json);
        assert_eq!(scraper.page_url(3), "https://x.org/?page=3");
        assert!(scraper.is_paged());
    }
}
