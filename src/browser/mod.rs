//! Page-rendering capability
//!
//! Discovery and auditing only ever talk to these traits:
//! - [`BrowserLauncher`] opens a browser session
//! - [`Browser`] hands out pages and is closed at the end of a run
//! - [`Page`] navigates, waits for a stable load, evaluates scripts and
//!   reports the anchor links of the loaded document
//!
//! Two backends exist: a plain HTTP backend (reqwest + scraper) that is
//! always available, and a headless Chromium backend behind the `chromium`
//! cargo feature.

#[cfg(feature = "chromium")]
mod chromium;
mod http;
mod pool;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumLauncher;
pub use http::{extract_anchor_links, HttpBrowser, HttpLauncher, HttpPage};
pub use pool::PagePool;

use crate::config::{BrowserBackend, BrowserConfig};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by the page-rendering capability
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Per-page navigation failure; displays the bare message
    #[error("{message}")]
    Navigation { url: String, message: String },

    #[error("Navigation timeout")]
    Timeout { url: String },

    #[error("Page evaluation failed: {0}")]
    Evaluation(String),

    #[error("{0} is not supported by this browser backend")]
    Unsupported(&'static str),

    #[error("Browser session closed: {0}")]
    Closed(String),
}

impl BrowserError {
    /// Returns true when the whole browser session is unusable
    ///
    /// Session failures abort the current run; every other error only
    /// affects the page that raised it.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::Launch(_) | Self::Closed(_))
    }

    pub(crate) fn navigation(url: &str, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// Where a navigation ended up
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    /// Final document URL after redirects
    pub final_url: Url,
    /// HTTP status of the main document, when the backend knows it
    pub status: Option<u16>,
}

impl Navigation {
    /// Returns true when the final URL differs from the one requested
    pub fn redirected_from(&self, requested: &Url) -> bool {
        &self.final_url != requested
    }
}

/// Opens browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError>;
}

/// An open browser session
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a new blank page
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError>;

    /// Tears down the session; pages handed out become unusable
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// A single browser tab
#[async_trait]
pub trait Page: Send {
    /// Navigates to `url`, failing with [`BrowserError::Timeout`] after `timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, BrowserError>;

    /// Waits until the loaded document has settled
    async fn wait_for_stable_load(&mut self) -> Result<(), BrowserError>;

    /// Evaluates `script` in the page, awaiting a returned promise
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// Returns the absolute http(s) targets of the document's links
    async fn extract_links(&mut self) -> Result<Vec<String>, BrowserError>;

    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Builds the launcher for the configured backend
///
/// # Arguments
///
/// * `config` - Browser section of the configuration
/// * `timeout` - Per-request timeout used by the HTTP backend's client
///
/// # Returns
///
/// * `Ok(Box<dyn BrowserLauncher>)` - Launcher for the configured backend
/// * `Err(BrowserError::Launch)` - The backend is not compiled in or cannot be set up
pub fn launcher_for(
    config: &BrowserConfig,
    timeout: Duration,
) -> Result<Box<dyn BrowserLauncher>, BrowserError> {
    match config.backend {
        BrowserBackend::Http => Ok(Box::new(HttpLauncher::new(&config.user_agent, timeout)?)),
        #[cfg(feature = "chromium")]
        BrowserBackend::Chromium => Ok(Box::new(ChromiumLauncher::new(config.clone(), timeout))),
        #[cfg(not(feature = "chromium"))]
        BrowserBackend::Chromium => Err(BrowserError::Launch(
            "the chromium backend requires building with `--features chromium`".to_string(),
        )),
    }
}
