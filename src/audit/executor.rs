//! Accessibility test executor
//!
//! Partitions the URL list into chunks of `concurrent` URLs. Chunks run one
//! after another; the URLs of a chunk run in parallel, each bound to the
//! pooled page with the same slot index.
//!
//! # Failure Policy
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Navigation / evaluation failure | Outcome with `error`, page not retried |
//! | Browser fails to launch or dies | Run aborted, pool released, error returned |

use crate::audit::engine::{AccessibilityEngine, WCAG_TAGS};
use crate::audit::model::{Finding, TestOutcome, TestResults, TestSummary};
use crate::audit::progress::{NoProgress, PageProgress, ProgressReporter};
use crate::browser::{BrowserError, BrowserLauncher, Page, PagePool};
use crate::config::ScanConfig;
use crate::util::{batches, now_iso8601};
use crate::LensError;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Timing and concurrency settings for a test run
#[derive(Debug, Clone, Copy)]
pub struct ExecutorSettings {
    pub concurrent: usize,
    pub timeout: Duration,
    pub wait_for_timeout: Duration,
    pub chunk_delay: Duration,
}

impl From<&ScanConfig> for ExecutorSettings {
    fn from(scan: &ScanConfig) -> Self {
        Self {
            concurrent: scan.concurrent.max(1),
            timeout: scan.timeout(),
            wait_for_timeout: scan.wait_for_timeout(),
            chunk_delay: scan.chunk_delay(),
        }
    }
}

/// Runs accessibility audits over a URL list
pub struct TestExecutor {
    launcher: Arc<dyn BrowserLauncher>,
    engine: Arc<dyn AccessibilityEngine>,
    settings: ExecutorSettings,
    progress: Arc<dyn ProgressReporter>,
}

impl TestExecutor {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        engine: Arc<dyn AccessibilityEngine>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            launcher,
            engine,
            settings,
            progress: Arc::new(NoProgress),
        }
    }

    /// Replaces the progress reporter
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Audits every URL and returns one outcome per URL, in input order
    ///
    /// # Arguments
    ///
    /// * `urls` - Pages to audit
    /// * `verbose` - Log every page outcome at `info` instead of `debug`
    ///
    /// # Returns
    ///
    /// * `Ok(TestResults)` - One outcome per URL, `completedAt` stamped at the end
    /// * `Err(LensError::Session)` - The browser session failed; no partial results
    pub async fn test_urls(
        &self,
        urls: &[String],
        verbose: bool,
    ) -> Result<TestResults, LensError> {
        let mut summary = TestSummary::new(urls.len());

        if urls.is_empty() {
            tracing::info!("No pages to test");
            summary.complete();
            return Ok(TestResults {
                summary,
                violations: Vec::new(),
            });
        }

        let pool_size = self.settings.concurrent.min(urls.len());
        let mut pool = PagePool::open(self.launcher.as_ref(), pool_size).await?;

        self.progress.on_start(urls.len());
        let run = self.run_chunks(&mut pool, urls, verbose, &mut summary).await;
        pool.close().await;

        let violations = run?;
        summary.complete();
        self.progress.on_finish(&summary);

        tracing::info!(
            "Testing complete: {} page(s), {} with violations, {} violation(s)",
            summary.total_pages,
            summary.pages_with_violations,
            summary.total_violations
        );

        Ok(TestResults {
            summary,
            violations,
        })
    }

    async fn run_chunks(
        &self,
        pool: &mut PagePool,
        urls: &[String],
        verbose: bool,
        summary: &mut TestSummary,
    ) -> Result<Vec<TestOutcome>, LensError> {
        let chunk_size = pool.size();
        let chunk_count = urls.len().div_ceil(chunk_size);
        let completed = AtomicUsize::new(0);
        let mut outcomes = Vec::with_capacity(urls.len());

        for (index, chunk) in batches(urls, chunk_size).enumerate() {
            tracing::debug!("Chunk {}/{}: {} page(s)", index + 1, chunk_count, chunk.len());

            let settled = join_all(chunk.iter().zip(pool.pages_mut().iter_mut()).map(
                |(url, page)| self.audit_one(page.as_mut(), url, verbose, &completed, urls.len()),
            ))
            .await;

            let chunk_outcomes = settled.into_iter().collect::<Result<Vec<_>, _>>()?;
            summary.record_chunk(&chunk_outcomes);
            outcomes.extend(chunk_outcomes);

            if index + 1 < chunk_count && !self.settings.chunk_delay.is_zero() {
                tokio::time::sleep(self.settings.chunk_delay).await;
            }
        }

        Ok(outcomes)
    }

    /// Audits one URL; only session failures escape as errors
    async fn audit_one(
        &self,
        page: &mut dyn Page,
        url: &str,
        verbose: bool,
        completed: &AtomicUsize,
        total: usize,
    ) -> Result<TestOutcome, BrowserError> {
        let outcome = match self.audit_page(page, url).await {
            Ok(findings) => TestOutcome::violations(url, now_iso8601(), findings),
            Err(e) if e.is_session_failure() => {
                tracing::error!("Browser session failed while testing {}: {}", url, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Testing {} failed: {}", url, e);
                TestOutcome::error(url, now_iso8601(), e.to_string())
            }
        };

        if verbose {
            tracing::info!("{}: {} violation(s)", url, outcome.finding_count());
        } else {
            tracing::debug!("{}: {} violation(s)", url, outcome.finding_count());
        }

        self.progress.on_page(&PageProgress {
            url,
            class: outcome.class(),
            count: outcome.finding_count(),
            completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
            total,
        });

        Ok(outcome)
    }

    async fn audit_page(
        &self,
        page: &mut dyn Page,
        url: &str,
    ) -> Result<Vec<Finding>, BrowserError> {
        page.navigate(url, self.settings.timeout).await?;
        page.wait_for_stable_load().await?;

        if !self.settings.wait_for_timeout.is_zero() {
            tokio::time::sleep(self.settings.wait_for_timeout).await;
        }

        self.engine.run_rules(page, &WCAG_TAGS).await
    }
}
