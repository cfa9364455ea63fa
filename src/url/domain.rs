use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_lens::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs have the same hostname
///
/// Only the hostname is compared: scheme and port may differ. URLs without a
/// host never match.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_lens::url::same_host;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// assert!(same_host(&base, &Url::parse("http://example.com/about").unwrap()));
/// assert!(!same_host(&base, &Url::parse("https://blog.example.com/").unwrap()));
/// ```
pub fn same_host(base: &Url, candidate: &Url) -> bool {
    match (extract_domain(base), extract_domain(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
