//! Integration tests for sitemap discovery
//!
//! These tests use wiremock for remote sitemaps and tempfile for local
//! ones, exercising fetch, retry, parsing and merging end-to-end.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;
use sumi_lens::config::ScanConfig;
use sumi_lens::sitemap::{ContentFetcher, SitemapDiscovery};
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const XML_SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-01-01</lastmod>
    <changefreq>daily</changefreq>
    <priority>1.0</priority>
  </url>
  <url>
    <loc>https://example.com/about/team</loc>
    <priority>0.8</priority>
  </url>
</urlset>"#;

/// Scan settings with fast retries
fn scan_config(max_retries: u32) -> ScanConfig {
    ScanConfig {
        max_retries,
        retry_delay: 10,
        timeout: 5_000,
        ..ScanConfig::default()
    }
}

fn discovery(max_retries: u32) -> SitemapDiscovery {
    let fetcher = ContentFetcher::with_timeout("TestBot/1.0", Duration::from_secs(5))
        .expect("Failed to build fetcher");
    SitemapDiscovery::new(fetcher, &scan_config(max_retries))
}

fn local_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn single(name: &str, location: String) -> BTreeMap<String, String> {
    let mut sitemaps = BTreeMap::new();
    sitemaps.insert(name.to_string(), location);
    sitemaps
}

#[tokio::test]
async fn test_remote_xml_sitemap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(XML_SITEMAP, "application/xml"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let sitemaps = single("main", format!("{}/sitemap.xml", mock_server.uri()));
    let entries = discovery(3).discover(&sitemaps).await.unwrap();

    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].url, "https://example.com/");
    assert_eq!(entries[0].path, "/");
    assert_eq!(entries[0].slug, "");
    assert_eq!(entries[0].last_modified.as_deref(), Some("2024-01-01"));
    assert_eq!(entries[0].change_frequency.as_deref(), Some("daily"));
    assert_eq!(entries[0].priority, Some(1.0));

    assert_eq!(entries[1].path, "/about/team");
    assert_eq!(entries[1].slug, "team");
    assert_eq!(entries[1].last_modified, None);
    assert_eq!(entries[1].priority, Some(0.8));
}

#[tokio::test]
async fn test_retries_until_success() {
    let mock_server = MockServer::start().await;

    // Two failures, then the sitemap
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(XML_SITEMAP))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sitemaps = single("main", format!("{}/sitemap.xml", mock_server.uri()));
    let (entries, reports) = discovery(3).discover_with_reports(&sitemaps).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].attempts, 3);
    assert!(reports[0].error.is_none());
}

#[tokio::test]
async fn test_exhausted_retries_degrade_to_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(XML_SITEMAP))
        .mount(&mock_server)
        .await;

    let mut sitemaps = BTreeMap::new();
    sitemaps.insert(
        "broken".to_string(),
        format!("{}/broken.xml", mock_server.uri()),
    );
    sitemaps.insert(
        "main".to_string(),
        format!("{}/sitemap.xml", mock_server.uri()),
    );

    let (entries, reports) = discovery(2).discover_with_reports(&sitemaps).await.unwrap();

    // The healthy sitemap still contributes
    assert_eq!(entries.len(), 2);

    let broken = reports.iter().find(|r| r.name == "broken").unwrap();
    assert_eq!(broken.attempts, 3);
    assert_eq!(broken.entries, 0);
    assert!(broken.error.as_deref().unwrap().contains("500"));
}

#[tokio::test]
async fn test_local_json_sitemap() {
    let file = local_file(
        r#"{
            "urls": [
                {
                    "url": "https://example.com/docs/intro",
                    "lastmod": "2024-02-02",
                    "priority": 0.5
                },
                { "url": "https://example.com/blog/" }
            ]
        }"#,
    );

    let sitemaps = single("docs", file.path().display().to_string());
    let entries = discovery(0).discover(&sitemaps).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].slug, "intro");
    assert_eq!(entries[0].last_modified.as_deref(), Some("2024-02-02"));
    assert_eq!(entries[0].priority, Some(0.5));
    assert_eq!(entries[1].slug, "blog");
    assert_eq!(entries[1].change_frequency, None);
}

#[tokio::test]
async fn test_merges_sitemaps_unique_by_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(XML_SITEMAP))
        .mount(&mock_server)
        .await;

    let file = local_file(
        r#"{ "urls": [
            { "url": "https://example.com/" },
            { "url": "https://example.com/contact" }
        ] }"#,
    );

    let mut sitemaps = BTreeMap::new();
    sitemaps.insert(
        "a-remote".to_string(),
        format!("{}/sitemap.xml", mock_server.uri()),
    );
    sitemaps.insert("b-local".to_string(), file.path().display().to_string());

    let entries = discovery(0).discover(&sitemaps).await.unwrap();
    let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();

    assert_eq!(
        urls,
        vec![
            "https://example.com/",
            "https://example.com/about/team",
            "https://example.com/contact",
        ]
    );
}

#[tokio::test]
async fn test_empty_urlset_yields_no_entries() {
    let file =
        local_file(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#);

    let sitemaps = single("empty", file.path().display().to_string());
    let (entries, reports) = discovery(3).discover_with_reports(&sitemaps).await.unwrap();

    assert!(entries.is_empty());
    assert_eq!(reports[0].attempts, 1);
    assert!(reports[0].error.is_none());
}
