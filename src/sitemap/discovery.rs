//! Sitemap discovery engine
//!
//! Fetches named sitemaps in batches of `concurrent`, retrying failed fetches
//! with a fixed wait, and merges the parsed entries.
//!
//! # Failure Policy
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Fetch error / timeout / non-2xx | Retry up to `max-retries` times, `retry-delay` apart |
//! | Retries exhausted | Logged, sitemap contributes zero entries |
//! | Malformed content | Not retried, sitemap contributes zero entries |
//! | Wall-clock ceiling reached | Remaining batches skipped, partial result returned |

use crate::config::ScanConfig;
use crate::sitemap::fetch::ContentFetcher;
use crate::sitemap::parser::parse_sitemap;
use crate::sitemap::{SitemapEntry, SitemapError};
use crate::util::{batches, RetryPolicy};
use crate::{ConfigError, LensError};
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

/// Default wall-clock ceiling for one discovery run
pub const MAX_DISCOVERY_TIME: Duration = Duration::from_secs(5 * 60);

/// What happened to one named sitemap during discovery
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapReport {
    pub name: String,
    pub location: String,
    /// Fetch attempts made, including the first
    pub attempts: u32,
    /// Entries contributed before deduplication
    pub entries: usize,
    /// Final error when the sitemap contributed nothing because of a failure
    pub error: Option<String>,
}

/// Sitemap discovery engine
pub struct SitemapDiscovery {
    fetcher: ContentFetcher,
    concurrent: usize,
    retry: RetryPolicy,
    max_duration: Duration,
}

impl SitemapDiscovery {
    /// Creates a discovery engine using the shared scan settings
    pub fn new(fetcher: ContentFetcher, scan: &ScanConfig) -> Self {
        Self {
            fetcher,
            concurrent: scan.concurrent.max(1),
            retry: RetryPolicy::new(scan.max_retries, scan.retry_delay()),
            max_duration: scan.max_duration(),
        }
    }

    /// Overrides the wall-clock ceiling
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Discovers pages from every named sitemap
    ///
    /// # Arguments
    ///
    /// * `sitemaps` - Sitemap name -> URL or local path; must not be empty
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SitemapEntry>)` - Merged entries, unique by URL, in sitemap order
    /// * `Err(LensError::Config)` - No sitemaps were given
    pub async fn discover(
        &self,
        sitemaps: &BTreeMap<String, String>,
    ) -> Result<Vec<SitemapEntry>, LensError> {
        self.discover_with_reports(sitemaps)
            .await
            .map(|(entries, _)| entries)
    }

    /// Same as [`discover`](Self::discover), also returning one report per processed sitemap
    pub async fn discover_with_reports(
        &self,
        sitemaps: &BTreeMap<String, String>,
    ) -> Result<(Vec<SitemapEntry>, Vec<SitemapReport>), LensError> {
        if sitemaps.is_empty() {
            return Err(ConfigError::Validation("no sitemaps to discover".to_string()).into());
        }

        let started = Instant::now();
        let targets: Vec<(&String, &String)> = sitemaps.iter().collect();

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut reports = Vec::with_capacity(targets.len());

        tracing::info!(
            "Discovering pages from {} sitemap(s), {} at a time",
            targets.len(),
            self.concurrent
        );

        for batch in batches(&targets, self.concurrent) {
            if started.elapsed() >= self.max_duration {
                tracing::warn!(
                    "Sitemap discovery exceeded {:?}; {} sitemap(s) left unprocessed",
                    self.max_duration,
                    targets.len() - reports.len()
                );
                break;
            }

            let results = join_all(
                batch
                    .iter()
                    .map(|(name, location)| self.load_one(name, location)),
            )
            .await;

            for (found, report) in results {
                for entry in found {
                    if seen.insert(entry.url.clone()) {
                        entries.push(entry);
                    }
                }
                reports.push(report);
            }
        }

        tracing::info!(
            "Discovered {} unique page(s) from {} sitemap(s) in {:?}",
            entries.len(),
            reports.len(),
            started.elapsed()
        );

        Ok((entries, reports))
    }

    /// Fetches and parses one sitemap; never fails, degrades to zero entries
    async fn load_one(&self, name: &str, location: &str) -> (Vec<SitemapEntry>, SitemapReport) {
        let label = format!("Sitemap '{}' ({})", name, location);
        let outcome = self
            .retry
            .run(&label, |_| self.fetcher.fetch(location))
            .await;

        let mut report = SitemapReport {
            name: name.to_string(),
            location: location.to_string(),
            attempts: outcome.attempts,
            entries: 0,
            error: None,
        };

        let parsed = outcome
            .result
            .map_err(SitemapError::from)
            .and_then(|content| parse_sitemap(&content).map_err(SitemapError::from));

        match parsed {
            Ok((format, found)) => {
                tracing::debug!(
                    "{}: {} entries ({:?}) after {} attempt(s)",
                    label,
                    found.len(),
                    format,
                    outcome.attempts
                );
                report.entries = found.len();
                (found, report)
            }
            Err(e) => {
                tracing::warn!("{} contributed no pages: {}", label, e);
                report.error = Some(e.to_string());
                (Vec::new(), report)
            }
        }
    }
}
