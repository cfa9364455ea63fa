//! Integration tests for the discovery-and-test pipeline
//!
//! The HTTP backend cannot evaluate scripts, so every audit it runs ends in
//! an error outcome; these tests check that such runs still complete,
//! keep their ordering and write their reports.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use sumi_lens::audit::{AxeEngine, ExecutorSettings, OutcomeClass, TestExecutor};
use sumi_lens::browser::{BrowserLauncher, HttpLauncher};
use sumi_lens::config::{parse_toml_config, Config};
use sumi_lens::pipeline::{run_pipeline, PipelineOptions};
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

fn axe_script() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        b"window.axe = { run: function () { return Promise.resolve({ violations: [] }); } };",
    )
    .unwrap();
    file.flush().unwrap();
    file
}

/// A fast-running config auditing the mock server's sitemap
fn sitemap_config(server_uri: &str, axe: &NamedTempFile, output: &TempDir) -> Config {
    parse_toml_config(&format!(
        r#"
        [scan]
        timeout = 5000
        max-retries = 0
        retry-delay = 10
        concurrent = 2
        chunk-delay = 0

        [sitemaps]
        main = "{uri}/sitemap.xml"

        [axe]
        script = "{axe}"

        [output]
        directory = "{out}"
        formats = ["json", "markdown"]
        "#,
        uri = server_uri,
        axe = axe.path().display(),
        out = output.path().display(),
    ))
    .expect("Failed to parse config")
}

#[tokio::test]
async fn test_pipeline_over_sitemap_writes_reports() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();

    let sitemap = format!(
        concat!(
            "<urlset>",
            "<url><loc>{uri}/a</loc></url>",
            "<url><loc>{uri}/b</loc></url>",
            "<url><loc>{uri}/a</loc></url>",
            "</urlset>"
        ),
        uri = uri
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/a", "<html><body>A</body></html>").await;
    mount_html(&mock_server, "/b", "<html><body>B</body></html>").await;

    let axe = axe_script();
    let output = TempDir::new().unwrap();
    let config = sitemap_config(&uri, &axe, &output);

    let options = PipelineOptions {
        config_hash: "deadbeef".to_string(),
        ..PipelineOptions::default()
    };
    let result = run_pipeline(&config, options).await.expect("Pipeline failed");

    // Duplicate sitemap entries are tested once
    let urls: Vec<&str> = result.results.violations.iter().map(|o| o.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{}/a", uri), format!("{}/b", uri)]);

    let summary = &result.results.summary;
    assert_eq!(summary.total_pages, 2);
    assert_eq!(summary.pages_with_violations, 0);
    assert_eq!(summary.total_violations, 0);
    assert!(!summary.completed_at.is_empty());

    for outcome in &result.results.violations {
        assert_eq!(outcome.class(), OutcomeClass::Error);
        assert!(outcome.findings().is_none());
    }

    assert_eq!(result.reports.len(), 2);
    let json = std::fs::read_to_string(output.path().join("report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["configHash"], "deadbeef");
    assert_eq!(value["results"]["summary"]["totalPages"], 2);
    assert!(value["results"]["violations"][0]["error"].is_string());
    assert!(value["results"]["violations"][0].get("violations").is_none());

    let markdown = std::fs::read_to_string(output.path().join("report.md")).unwrap();
    assert!(markdown.contains("## Pages Not Tested"));
}

#[tokio::test]
async fn test_output_dir_override() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset></urlset>"))
        .mount(&mock_server)
        .await;

    let axe = axe_script();
    let configured = TempDir::new().unwrap();
    let override_dir = TempDir::new().unwrap();
    let config = sitemap_config(&uri, &axe, &configured);

    let options = PipelineOptions {
        output_dir: Some(override_dir.path().to_path_buf()),
        ..PipelineOptions::default()
    };
    let result = run_pipeline(&config, options).await.expect("Pipeline failed");

    assert!(result.pages.is_empty());
    assert_eq!(result.results.summary.total_pages, 0);
    assert!(override_dir.path().join("report.json").exists());
    assert!(!configured.path().join("report.json").exists());
}

#[tokio::test]
async fn test_missing_axe_script_fails_before_discovery() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset></urlset>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let axe = axe_script();
    let output = TempDir::new().unwrap();
    let mut config = sitemap_config(&mock_server.uri(), &axe, &output);
    config.axe.script = "/nonexistent/axe.min.js".to_string();

    let result = run_pipeline(&config, PipelineOptions::default()).await;
    assert!(matches!(result, Err(sumi_lens::LensError::Engine(_))));
}

#[tokio::test]
async fn test_executor_records_navigation_errors() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/page", "<html></html>").await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let launcher: Arc<dyn BrowserLauncher> =
        Arc::new(HttpLauncher::new("TestBot/1.0", Duration::from_secs(10)).unwrap());
    let engine = Arc::new(AxeEngine::from_source("window.axe = {};"));
    let settings = ExecutorSettings {
        concurrent: 2,
        timeout: Duration::from_millis(200),
        wait_for_timeout: Duration::ZERO,
        chunk_delay: Duration::ZERO,
    };

    let urls = vec![
        format!("{}/hang", mock_server.uri()),
        format!("{}/page", mock_server.uri()),
        "http://127.0.0.1:9/refused".to_string(),
    ];
    let results = TestExecutor::new(launcher, engine, settings)
        .test_urls(&urls, false)
        .await
        .expect("Per-page failures must not fail the run");

    assert_eq!(results.summary.total_pages, 3);
    assert_eq!(results.violations.len(), 3);
    assert_eq!(results.violations[0].error_message(), Some("Navigation timeout"));
    assert!(results.violations[1]
        .error_message()
        .unwrap()
        .contains("not supported"));
    assert!(results.violations[2].error_message().is_some());

    let ordered: Vec<&str> = results.violations.iter().map(|o| o.url.as_str()).collect();
    assert_eq!(ordered, urls.iter().map(String::as_str).collect::<Vec<_>>());
}
