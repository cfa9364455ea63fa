//! Sitemap-based page discovery
//!
//! This module contains:
//! - The content fetcher (remote URL or local file, bounded timeout)
//! - The XML/JSON sitemap parser
//! - The discovery engine that fetches named sitemaps in batches with retry

mod discovery;
mod fetch;
mod parser;

pub use discovery::{SitemapDiscovery, SitemapReport, MAX_DISCOVERY_TIME};
pub use fetch::{build_http_client, is_remote, ContentFetcher, FetchError};
pub use parser::{parse_sitemap, ParseError, SitemapFormat};

use crate::url::path_and_slug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// A page belonging to the site
///
/// Produced by the sitemap parser, or by website discovery when a page is
/// visited. Unique by `url` within one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    /// Absolute page URL
    pub url: String,
    /// URL path component
    pub path: String,
    /// Last non-empty path segment, empty for the root
    pub slug: String,
    pub last_modified: Option<String>,
    pub change_frequency: Option<String>,
    /// Sitemap priority in `0.0..=1.0`
    pub priority: Option<f64>,
}

impl SitemapEntry {
    /// Creates an entry with derived path and slug and no metadata
    pub fn from_url(url: &Url) -> Self {
        let (path, slug) = path_and_slug(url);
        Self {
            url: url.to_string(),
            path,
            slug,
            last_modified: None,
            change_frequency: None,
            priority: None,
        }
    }

    /// Creates the entry recorded for a page visited during a crawl
    ///
    /// `last_modified` carries the navigation timestamp.
    pub fn visited(url: &Url, timestamp: String) -> Self {
        Self {
            last_modified: Some(timestamp),
            ..Self::from_url(url)
        }
    }
}

/// Failure to load one sitemap
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
