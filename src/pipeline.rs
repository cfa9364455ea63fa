//! Discovery-and-test pipeline
//!
//! 1. Discover pages: sitemaps when configured, otherwise a website crawl
//! 2. Build the ordered URL list, unique by URL (first occurrence wins)
//! 3. Audit every URL with the test executor
//! 4. Write each configured report format

use crate::audit::{
    AxeEngine, ExecutorSettings, NoProgress, ProgressReporter, TestExecutor, TestResults,
};
use crate::browser::{launcher_for, BrowserLauncher};
use crate::config::{BrowserBackend, Config};
use crate::crawler::{CrawlSettings, WebsiteDiscovery};
use crate::output::{write_reports, AuditReport, ReportFormat};
use crate::sitemap::{ContentFetcher, SitemapDiscovery, SitemapEntry};
use crate::util::now_iso8601;
use crate::{ConfigError, LensError};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Caller-controlled knobs for one pipeline run
#[derive(Clone)]
pub struct PipelineOptions {
    /// Log every page outcome at `info`
    pub verbose: bool,
    pub progress: Arc<dyn ProgressReporter>,
    /// Overrides `[output] directory`
    pub output_dir: Option<PathBuf>,
    /// Written into reports
    pub config_hash: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            progress: Arc::new(NoProgress),
            output_dir: None,
            config_hash: String::new(),
        }
    }
}

/// What a completed pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub pages: Vec<SitemapEntry>,
    pub results: TestResults,
    /// Report files written
    pub reports: Vec<PathBuf>,
}

/// Discovers the site's pages from the configured source
///
/// Sitemaps take precedence when both sources are configured.
///
/// # Returns
///
/// * `Ok(Vec<SitemapEntry>)` - Discovered pages, possibly empty
/// * `Err(LensError)` - No source configured, invalid settings, or browser session failure
pub async fn discover_pages(
    config: &Config,
    launcher: Arc<dyn BrowserLauncher>,
) -> Result<Vec<SitemapEntry>, LensError> {
    if !config.sitemaps.is_empty() {
        if config.website.is_some() {
            tracing::warn!("Both [sitemaps] and [website] are configured; using sitemaps");
        }
        let fetcher = content_fetcher(config)?;
        return SitemapDiscovery::new(fetcher, &config.scan)
            .discover(&config.sitemaps)
            .await;
    }

    match &config.website {
        Some(website) => {
            WebsiteDiscovery::new(launcher, website.clone(), CrawlSettings::from(&config.scan))
                .crawl()
                .await
        }
        None => Err(ConfigError::Validation(
            "either [website] or [sitemaps] must be configured".to_string(),
        )
        .into()),
    }
}

/// URLs of `pages` in order, keeping the first occurrence of each
pub fn unique_urls(pages: &[SitemapEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    pages
        .iter()
        .filter(|page| seen.insert(page.url.as_str()))
        .map(|page| page.url.clone())
        .collect()
}

/// Runs discovery only, with the configured backend
pub async fn run_discovery(config: &Config) -> Result<Vec<SitemapEntry>, LensError> {
    let launcher: Arc<dyn BrowserLauncher> =
        Arc::from(launcher_for(&config.browser, config.scan.timeout())?);
    discover_pages(config, launcher).await
}

/// Runs the whole pipeline
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `options` - Progress, verbosity, and output overrides
///
/// # Returns
///
/// * `Ok(PipelineOutput)` - Pages, results, and the report files written
/// * `Err(LensError)` - A run-level failure (configuration, engine, session, report IO)
pub async fn run_pipeline(
    config: &Config,
    options: PipelineOptions,
) -> Result<PipelineOutput, LensError> {
    let formats = ReportFormat::parse_all(&config.output.formats).map_err(ConfigError::Validation)?;

    let launcher: Arc<dyn BrowserLauncher> =
        Arc::from(launcher_for(&config.browser, config.scan.timeout())?);

    let fetcher = content_fetcher(config)?;
    let engine = AxeEngine::load(&fetcher, &config.axe.script).await?;

    if config.browser.backend == BrowserBackend::Http {
        tracing::warn!(
            "The http backend cannot run page scripts; every audit will report an error. \
             Use backend = \"chromium\" to audit pages."
        );
    }

    let pages = discover_pages(config, launcher.clone()).await?;
    let urls = unique_urls(&pages);
    tracing::info!("{} unique page(s) to test", urls.len());

    let settings = ExecutorSettings::from(&config.scan);
    let executor = TestExecutor::new(launcher, Arc::new(engine), settings)
        .with_progress(options.progress.clone());
    let results = executor.test_urls(&urls, options.verbose).await?;

    let directory = options
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let report = AuditReport {
        config_hash: &options.config_hash,
        generated_at: now_iso8601(),
        pages: &pages,
        results: &results,
    };
    let reports = write_reports(&directory, &formats, &report)?;

    Ok(PipelineOutput {
        pages,
        results,
        reports,
    })
}

fn content_fetcher(config: &Config) -> Result<ContentFetcher, LensError> {
    Ok(ContentFetcher::with_timeout(
        &config.browser.user_agent,
        config.scan.timeout(),
    )?)
}
