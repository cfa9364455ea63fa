//! Sumi-Lens: a sitemap-driven accessibility auditor
//!
//! This crate discovers the pages belonging to a site, either from one or more
//! sitemaps or by following same-host links, and runs an accessibility audit
//! against every page with a bounded pool of browser pages.

pub mod audit;
pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod sitemap;
pub mod url;
pub mod util;

use thiserror::Error;

/// Main error type for run-level Sumi-Lens failures
///
/// Per-page and per-sitemap failures never surface here; they are folded into
/// the unit's own result record.
#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session failed: {0}")]
    Session(#[from] browser::BrowserError),

    #[error("Failed to load accessibility engine: {0}")]
    Engine(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Report error: {0}")]
    Report(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Lens operations
pub type Result<T> = std::result::Result<T, LensError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{Finding, Impact, TestExecutor, TestOutcome, TestResults, TestSummary};
pub use config::Config;
pub use crawler::WebsiteDiscovery;
pub use sitemap::{SitemapDiscovery, SitemapEntry};
pub use url::{normalize_url, same_host, UrlFilter};
