//! HTTP client with bounded retry and backoff.
//!
//! Shared by the scraper and the downloader. Only establishing the response is
//! retried; reading a body is a single attempt.

use std::time::{Duration, Instant};

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::{Result, WikiwallError};

/// Identifies us to the gallery site.
const USER_AGENT: &str = concat!("wikiwall/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transient errors. At most
    /// `max_retries + 1` requests are sent, and retrying also stops once
    /// `timeout * max_retries` has elapsed.
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(3),
        }
    }
}

pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    /// GET `url`, retrying transient failures, and return the successful response.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<Response> {
        let mut attempt = 0u32;

        retry_notify(
            self.build_backoff(),
            || {
                attempt += 1;
                let exhausted = attempt > self.config.max_retries;
                async move {
                    match self.get_once(url).await {
                        Err(backoff::Error::Transient { err, .. }) if exhausted => {
                            warn!(attempts = attempt, "Retries exhausted");
                            Err(backoff::Error::permanent(err))
                        }
                        other => other,
                    }
                }
            },
            |err: WikiwallError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.get(url).await?.text().await?)
    }

    async fn get_once(&self, url: &str) -> std::result::Result<Response, backoff::Error<WikiwallError>> {
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(WikiwallError::Http(e))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(WikiwallError::Http(e))
            }
        })?;

        let status = response.status();
        debug!(status = %status, latency_ms = start.elapsed().as_millis() as u64, "Received HTTP response");

        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) if is_transient_status(status) => {
                warn!(status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(WikiwallError::Http(e)))
            }
            Err(e) => {
                warn!(status = %status, "Permanent HTTP error");
                Err(backoff::Error::permanent(WikiwallError::Http(e)))
            }
        }
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
