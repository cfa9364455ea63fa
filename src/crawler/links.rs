use crate::config::WebsiteConfig;
use crate::url::{normalize_parsed, normalize_url, same_host, UrlFilter};
use crate::LensError;
use std::collections::HashSet;
use url::Url;

/// Turns raw page links into crawlable same-host URLs
///
/// A candidate is kept when it:
/// 1. Resolves against the page URL to an http(s) URL
/// 2. Normalizes (fragment dropped, query dropped when `strip_query`, no trailing slash)
/// 3. Has the same hostname as the base URL
/// 4. Passes the include/exclude patterns
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    base: Url,
    filter: UrlFilter,
    strip_query: bool,
}

impl LinkExtractor {
    pub fn new(base: Url, filter: UrlFilter, strip_query: bool) -> Self {
        Self {
            base,
            filter,
            strip_query,
        }
    }

    /// Builds an extractor from the website settings
    ///
    /// # Returns
    ///
    /// * `Ok(LinkExtractor)` - Base URL normalized, patterns compiled
    /// * `Err(LensError)` - Invalid base URL or pattern
    pub fn from_config(config: &WebsiteConfig) -> Result<Self, LensError> {
        let base = normalize_url(&config.base_url, config.strip_query)?;
        let filter = UrlFilter::new(&config.include_patterns, &config.exclude_patterns)?;
        Ok(Self::new(base, filter, config.strip_query))
    }

    /// The normalized base URL the crawl starts from
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Normalizes a URL the way crawl keys are normalized
    pub fn normalize(&self, url: Url) -> Option<Url> {
        normalize_parsed(url, self.strip_query).ok()
    }

    /// Returns true when a normalized URL is on the base host and passes the patterns
    pub fn accepts(&self, url: &Url) -> bool {
        same_host(&self.base, url) && self.filter.accepts(url.as_str())
    }

    /// Resolves and filters one raw link found on `page_url`
    pub fn candidate(&self, raw: &str, page_url: &Url) -> Option<Url> {
        let resolved = page_url.join(raw.trim()).ok()?;
        let normalized = self.normalize(resolved)?;

        if self.accepts(&normalized) {
            Some(normalized)
        } else {
            tracing::trace!("Not following {}", normalized);
            None
        }
    }

    /// Filters a page's links, keeping first occurrences in document order
    pub fn extract(&self, links: &[String], page_url: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        links
            .iter()
            .filter_map(|raw| self.candidate(raw, page_url))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}
