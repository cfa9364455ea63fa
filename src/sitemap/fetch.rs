//! Content fetcher
//!
//! Reads raw text from an HTTP(S) URL or a local path. Remote reads are bound
//! by the client timeout; a non-2xx status is an error.

use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading sitemap (or script) content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Builds the HTTP client used for content fetches
///
/// # Arguments
///
/// * `user_agent` - User agent header value
/// * `timeout` - Total time allowed for one request
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches raw content from URLs or local files
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with its own client
    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, timeout)?))
    }

    /// Reads the content at `location`
    ///
    /// `http://` and `https://` locations are fetched with a GET request,
    /// `file://` URLs and anything else are read from the local filesystem.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The body or file content
    /// * `Err(FetchError)` - Network failure, timeout, non-2xx status, or IO error
    pub async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        if is_remote(location) {
            self.fetch_remote(location).await
        } else {
            read_local(location).await
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

/// Returns true for locations that must be fetched over the network
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

async fn read_local(location: &str) -> Result<String, FetchError> {
    let path = match location.strip_prefix("file://") {
        Some(stripped) => PathBuf::from(stripped),
        None => PathBuf::from(location),
    };

    tracing::debug!("Reading {}", path.display());

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| FetchError::Io { path, source })
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
