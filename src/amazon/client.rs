//! HTTP client for Amazon page fetching using wreq for TLS fingerprint emulation.

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Fixed browser identity sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// A page fetch that didn't produce a document.
///
/// Ordinary HTTP error codes land here as values, not panics - they are a
/// normal result to report. Retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or other transport problem.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: wreq::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { .. } => None,
        }
    }
}

/// Outcome of a single fetch, flattened for event reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub status: Option<u16>,
    pub error: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(err: &FetchError) -> Self {
        Self { status: err.status(), error: err.to_string() }
    }
}

/// Trait for product-page fetching - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Performs an HTTP GET and returns the page body.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Amazon HTTP client with browser impersonation.
pub struct AmazonClient {
    client: Client,
}

impl AmazonClient {
    /// Creates a new Amazon client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for AmazonClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_string(), source })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503) fetching {}", url);
        }

        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        response
            .text()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_string(), source })
    }
}
