//! HTTP browser backend
//!
//! Fetches documents with reqwest and reads links out of the static HTML with
//! scraper. Redirects are followed by the client, so the navigation reports
//! the final URL. Pages cannot run scripts.

use crate::browser::{Browser, BrowserError, BrowserLauncher, Navigation, Page};
use crate::sitemap::build_http_client;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Launcher for the HTTP backend; every session shares one client
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    client: Client,
}

impl HttpLauncher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, BrowserError> {
        let client = build_http_client(user_agent, timeout)
            .map_err(|e| BrowserError::Launch(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserLauncher for HttpLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        Ok(Box::new(HttpBrowser {
            client: self.client.clone(),
            open: true,
        }))
    }
}

/// HTTP "browser" session
#[derive(Debug)]
pub struct HttpBrowser {
    client: Client,
    open: bool,
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        if !self.open {
            return Err(BrowserError::Closed("browser already closed".to_string()));
        }
        Ok(Box::new(HttpPage::new(self.client.clone())))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.open = false;
        Ok(())
    }
}

/// The document most recently loaded into a page
#[derive(Debug)]
struct LoadedDocument {
    url: Url,
    body: String,
    is_html: bool,
}

/// One HTTP page; holds the last navigated document
#[derive(Debug)]
pub struct HttpPage {
    client: Client,
    current: Option<LoadedDocument>,
}

impl HttpPage {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }

    async fn load(&self, url: &str) -> Result<(LoadedDocument, u16), BrowserError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        // A missing Content-Type is treated as HTML
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
            .unwrap_or(true);

        let body = response.text().await.map_err(|e| classify(url, e))?;

        Ok((
            LoadedDocument {
                url: final_url,
                body,
                is_html,
            },
            status,
        ))
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, BrowserError> {
        tracing::debug!("GET {}", url);
        self.current = None;

        let (document, status) = match tokio::time::timeout(timeout, self.load(url)).await {
            Ok(loaded) => loaded?,
            Err(_) => {
                return Err(BrowserError::Timeout {
                    url: url.to_string(),
                })
            }
        };

        let navigation = Navigation {
            final_url: document.url.clone(),
            status: Some(status),
        };
        self.current = Some(document);
        Ok(navigation)
    }

    async fn wait_for_stable_load(&mut self) -> Result<(), BrowserError> {
        // The whole body is read during navigation
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<serde_json::Value, BrowserError> {
        Err(BrowserError::Unsupported("script evaluation"))
    }

    async fn extract_links(&mut self) -> Result<Vec<String>, BrowserError> {
        match &self.current {
            Some(doc) if doc.is_html => Ok(extract_anchor_links(&doc.body, &doc.url)),
            Some(_) => Ok(Vec::new()),
            None => Err(BrowserError::Evaluation("no document loaded".to_string())),
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.current = None;
        Ok(())
    }
}

fn classify(url: &str, error: reqwest::Error) -> BrowserError {
    if error.is_timeout() {
        BrowserError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_redirect() {
        BrowserError::navigation(url, format!("Redirect error: {}", error))
    } else if error.is_connect() {
        BrowserError::navigation(url, "Connection refused")
    } else {
        BrowserError::navigation(url, error.to_string())
    }
}

/// Extracts link targets from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Anything that is not http(s) after resolution
///
/// Relative links resolve against `<base href>` when present, else `page_url`.
///
/// # Example
///
/// ```
/// use sumi_lens::browser::extract_anchor_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_anchor_links(html, &base), vec!["https://example.com/page"]);
/// ```
pub fn extract_anchor_links(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let base_url = document_base(&document, page_url);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, &base_url))
            {
                links.push(absolute);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, &base_url))
            {
                links.push(absolute);
            }
        }
    }

    links
}

fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|e| e.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves a link href to an absolute http(s) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
