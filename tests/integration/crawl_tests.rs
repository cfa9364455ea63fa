//! Integration tests for website discovery
//!
//! These tests use wiremock to create mock HTTP servers and crawl them
//! end-to-end through the HTTP browser backend.

use std::sync::Arc;
use std::time::Duration;
use sumi_lens::browser::{BrowserLauncher, HttpLauncher};
use sumi_lens::config::WebsiteConfig;
use sumi_lens::crawler::{CrawlSettings, StopReason, WebsiteDiscovery};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn launcher() -> Arc<dyn BrowserLauncher> {
    Arc::new(
        HttpLauncher::new("TestBot/1.0", Duration::from_secs(5)).expect("Failed to build launcher"),
    )
}

fn settings() -> CrawlSettings {
    CrawlSettings {
        concurrent: 2,
        timeout: Duration::from_secs(5),
        max_duration: Duration::from_secs(60),
    }
}

/// Website settings without inter-batch delay
fn website(base_url: &str) -> WebsiteConfig {
    WebsiteConfig {
        crawl_delay: 0,
        ..WebsiteConfig::new(base_url)
    }
}

/// Mounts an HTML page whose body links to each of `links`
async fn mount_page(server: &MockServer, route: &str, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                format!(
                    "<html><head><title>{}</title></head><body>{}</body></html>",
                    route, anchors
                ),
                "text/html",
            ),
        )
        .mount(server)
        .await;
}

fn paths(entries: &[sumi_lens::SitemapEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &[
            "/page1",
            "/page2",
            "https://elsewhere.test/offsite",
            "mailto:team@example.com",
        ],
    )
    .await;
    mount_page(&mock_server, "/page1", &["/", "/page2#section"]).await;
    mount_page(&mock_server, "/page2", &["/page1?ref=nav"]).await;

    let discovery = WebsiteDiscovery::new(launcher(), website(&base_url), settings());
    let report = discovery.crawl_with_report().await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::QueueEmpty);
    assert_eq!(paths(&report.entries), vec!["/", "/page1", "/page2"]);
    assert_eq!(report.visited, 3);
    assert_eq!(report.failed, 0);

    // Visited pages are stamped with the navigation time and nothing else
    for entry in &report.entries {
        assert!(entry.last_modified.is_some());
        assert!(entry.priority.is_none());
        assert!(entry.change_frequency.is_none());
    }
}

#[tokio::test]
async fn test_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/a"]).await;
    mount_page(&mock_server, "/a", &["/a/b"]).await;
    mount_page(&mock_server, "/a/b", &["/a/b/c"]).await;

    let config = WebsiteConfig {
        max_depth: 1,
        ..website(&base_url)
    };
    let entries = WebsiteDiscovery::new(launcher(), config, settings())
        .crawl()
        .await
        .expect("Crawl failed");

    assert_eq!(paths(&entries), vec!["/", "/a"]);
}

#[tokio::test]
async fn test_max_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/1", "/2", "/3", "/4"]).await;
    for route in ["/1", "/2", "/3", "/4"] {
        mount_page(&mock_server, route, &[]).await;
    }

    let config = WebsiteConfig {
        max_pages: Some(3),
        ..website(&base_url)
    };
    let report = WebsiteDiscovery::new(launcher(), config, settings())
        .crawl_with_report()
        .await
        .expect("Crawl failed");

    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.stop_reason, StopReason::MaxPages);
}

#[tokio::test]
async fn test_each_page_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Every page links to every other page
    let all = ["/", "/x", "/y", "/z"];
    for route in all {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    concat!(
                        r#"<html><body><a href="/">h</a><a href="/x">x</a>"#,
                        r#"<a href="/y/">y</a><a href="/z#top">z</a></body></html>"#
                    ),
                    "text/html",
                ),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let entries = WebsiteDiscovery::new(launcher(), website(&base_url), settings())
        .crawl()
        .await
        .expect("Crawl failed");

    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn test_include_and_exclude_patterns() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &["/docs/intro", "/docs/admin/users", "/blog/post"],
    )
    .await;
    mount_page(&mock_server, "/docs/intro", &[]).await;
    mount_page(&mock_server, "/docs/admin/users", &[]).await;
    mount_page(&mock_server, "/blog/post", &[]).await;

    let config = WebsiteConfig {
        include_patterns: vec!["/docs/".to_string()],
        exclude_patterns: vec!["/admin".to_string()],
        ..website(&base_url)
    };
    let entries = WebsiteDiscovery::new(launcher(), config, settings())
        .crawl()
        .await
        .expect("Crawl failed");

    assert_eq!(paths(&entries), vec!["/", "/docs/intro"]);
}

#[tokio::test]
async fn test_redirect_records_final_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/old"]).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new", &[]).await;

    let entries = WebsiteDiscovery::new(launcher(), website(&base_url), settings())
        .crawl()
        .await
        .expect("Crawl failed");

    assert_eq!(paths(&entries), vec!["/", "/new"]);
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/missing", "/ok"]).await;
    mount_page(&mock_server, "/ok", &[]).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let report = WebsiteDiscovery::new(launcher(), website(&base_url), settings())
        .crawl_with_report()
        .await
        .expect("Crawl failed");

    assert_eq!(paths(&report.entries), vec!["/", "/ok"]);
    assert_eq!(report.visited, 3);
}

#[tokio::test]
async fn test_unreachable_base_yields_no_pages() {
    // Nothing listens on port 9 of the loopback address
    let entries = WebsiteDiscovery::new(launcher(), website("http://127.0.0.1:9"), settings())
        .crawl()
        .await
        .expect("Per-page failures must not abort the crawl");

    assert!(entries.is_empty());
}
