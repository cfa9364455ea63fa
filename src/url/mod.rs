//! URL handling module for Sumi-Lens
//!
//! This module provides URL normalization, host comparison and the
//! include/exclude pattern filter used by website discovery, plus the
//! path/slug derivation shared by every `SitemapEntry` producer.

mod domain;
mod filter;
mod normalize;

pub use domain::{extract_domain, same_host};
pub use filter::UrlFilter;
pub use normalize::{normalize_parsed, normalize_url};

use url::Url;

/// Derives the `(path, slug)` pair for a page URL
///
/// The slug is the last non-empty path segment, or an empty string for the root.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_lens::url::path_and_slug;
///
/// let url = Url::parse("https://x.test/guides/getting-started/").unwrap();
/// assert_eq!(
///     path_and_slug(&url),
///     ("/guides/getting-started/".to_string(), "getting-started".to_string())
/// );
/// ```
pub fn path_and_slug(url: &Url) -> (String, String) {
    let path = url.path().to_string();
    let slug = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
        .to_string();
    (path, slug)
}
