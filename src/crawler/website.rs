//! Website discovery engine
//!
//! Breadth-first crawl of the base URL's host. Each run owns its queue,
//! visited set and redirect ledger; nothing is shared between runs.
//!
//! # Per-task Flow
//!
//! 1. Dequeue; skip if already visited, mark visited
//! 2. Navigate with a pooled page and wait for a stable load
//! 3. If the navigation ended on another URL, enqueue that URL at the same
//!    depth (subject to the redirect ledger) instead of recording this one
//! 4. Otherwise record the page, and if `depth < max-depth` enqueue its
//!    same-host, pattern-accepted, unseen links at `depth + 1`
//!
//! # Failure Policy
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Navigation error / timeout / HTTP error status | Logged, page skipped |
//! | More than 5 redirects into a URL | URL skipped |
//! | Browser fails to launch or dies | Run aborted, pool released, error returned |

use crate::browser::{BrowserError, BrowserLauncher, Navigation, Page, PagePool};
use crate::config::{validate_website_config, ScanConfig, WebsiteConfig};
use crate::crawler::links::LinkExtractor;
use crate::sitemap::SitemapEntry;
use crate::util::now_iso8601;
use crate::LensError;
use futures::future::join_all;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Redirects into one URL tolerated before it is skipped
pub const MAX_REDIRECTS: u32 = 5;

/// Lifecycle of one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Why a completed crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QueueEmpty,
    MaxPages,
    TimeLimit,
}

/// A queued page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: u32,
}

/// Summary of a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub entries: Vec<SitemapEntry>,
    pub stop_reason: StopReason,
    /// URLs dequeued and navigated
    pub visited: usize,
    /// Navigations that failed
    pub failed: usize,
    pub elapsed: Duration,
}

/// What navigating one task produced
enum Visit {
    Loaded {
        navigation: Navigation,
        final_url: Url,
        links: Vec<String>,
        timestamp: String,
    },
    Failed(BrowserError),
}

/// State owned by one crawl run
struct CrawlRun {
    state: CrawlState,
    queue: VecDeque<CrawlTask>,
    enqueued: HashSet<Url>,
    visited: HashSet<Url>,
    redirects: HashMap<Url, u32>,
    entries: Vec<SitemapEntry>,
    failed: usize,
}

impl CrawlRun {
    fn new(base: Url) -> Self {
        let mut run = Self {
            state: CrawlState::Idle,
            queue: VecDeque::new(),
            enqueued: HashSet::new(),
            visited: HashSet::new(),
            redirects: HashMap::new(),
            entries: Vec::new(),
            failed: 0,
        };
        run.enqueue(base, 0);
        run
    }

    fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if self.visited.contains(&url) || !self.enqueued.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(CrawlTask { url, depth });
        true
    }

    /// Dequeues up to `slots` unvisited tasks and marks them visited
    fn next_batch(&mut self, slots: usize) -> Vec<CrawlTask> {
        let mut batch = Vec::with_capacity(slots);

        while batch.len() < slots {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            self.enqueued.remove(&task.url);

            if self.redirects.get(&task.url).copied().unwrap_or(0) > MAX_REDIRECTS {
                tracing::warn!("Skipping {}: too many redirects", task.url);
                continue;
            }
            if !self.visited.insert(task.url.clone()) {
                continue;
            }
            batch.push(task);
        }

        batch
    }

    fn remaining(&self, max_pages: Option<usize>) -> usize {
        max_pages.map_or(usize::MAX, |max| max.saturating_sub(self.entries.len()))
    }

    fn absorb(&mut self, task: CrawlTask, visit: Visit, extractor: &LinkExtractor) {
        let (navigation, final_url, links, timestamp) = match visit {
            Visit::Failed(e) => {
                tracing::warn!("Failed to load {}: {}", task.url, e);
                self.failed += 1;
                return;
            }
            Visit::Loaded {
                navigation,
                final_url,
                links,
                timestamp,
            } => (navigation, final_url, links, timestamp),
        };

        if let Some(status) = navigation.status.filter(|s| *s >= 400) {
            tracing::warn!("Skipping {}: HTTP {}", task.url, status);
            self.failed += 1;
            return;
        }

        if final_url != task.url {
            self.follow_redirect(&task, final_url, extractor);
            return;
        }

        tracing::debug!("Recorded [depth {}] {}", task.depth, final_url);
        self.entries.push(SitemapEntry::visited(&final_url, timestamp));

        let mut added = 0;
        for link in extractor.extract(&links, &final_url) {
            if self.enqueue(link, task.depth + 1) {
                added += 1;
            }
        }
        if added > 0 {
            tracing::debug!("Queued {} new link(s) from {}", added, final_url);
        }
    }

    fn follow_redirect(&mut self, task: &CrawlTask, final_url: Url, extractor: &LinkExtractor) {
        if !extractor.accepts(&final_url) {
            tracing::debug!("{} redirects off-site to {}", task.url, final_url);
            return;
        }

        let count = self.redirects.get(&task.url).copied().unwrap_or(0) + 1;
        let entry = self.redirects.entry(final_url.clone()).or_insert(0);
        *entry = (*entry).max(count);

        if *entry > MAX_REDIRECTS {
            tracing::warn!("Skipping {}: redirect loop via {}", final_url, task.url);
            return;
        }

        tracing::debug!("{} redirected to {}", task.url, final_url);
        self.enqueue(final_url, task.depth);
    }

    fn transition(&mut self, next: CrawlState) {
        tracing::debug!("Crawl state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Timing and bounds for a crawl
#[derive(Debug, Clone, Copy)]
pub struct CrawlSettings {
    pub concurrent: usize,
    pub timeout: Duration,
    pub max_duration: Duration,
}

impl From<&ScanConfig> for CrawlSettings {
    fn from(scan: &ScanConfig) -> Self {
        Self {
            concurrent: scan.concurrent.max(1),
            timeout: scan.timeout(),
            max_duration: scan.max_duration(),
        }
    }
}

/// Link-following website discovery
pub struct WebsiteDiscovery {
    launcher: Arc<dyn BrowserLauncher>,
    website: WebsiteConfig,
    settings: CrawlSettings,
}

impl WebsiteDiscovery {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        website: WebsiteConfig,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            launcher,
            website,
            settings,
        }
    }

    /// Crawls the site and returns the visited pages in completion order
    pub async fn crawl(&self) -> Result<Vec<SitemapEntry>, LensError> {
        self.crawl_with_report().await.map(|report| report.entries)
    }

    /// Crawls the site
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run completed; entries never exceed `max-pages`
    /// * `Err(LensError::Config)` - Invalid website settings; nothing was launched
    /// * `Err(LensError::Session)` - The browser session failed; the run aborted
    pub async fn crawl_with_report(&self) -> Result<CrawlReport, LensError> {
        validate_website_config(&self.website)?;
        let extractor = LinkExtractor::from_config(&self.website)?;

        let started = Instant::now();
        let mut run = CrawlRun::new(extractor.base().clone());

        tracing::info!(
            "Crawling {} (max depth {}, max pages {})",
            extractor.base(),
            self.website.max_depth,
            self.website
                .max_pages
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );

        run.transition(CrawlState::Running);
        let opened = PagePool::open(self.launcher.as_ref(), self.settings.concurrent).await;
        let mut pool = match opened {
            Ok(pool) => pool,
            Err(e) => {
                run.transition(CrawlState::Aborted);
                return Err(e.into());
            }
        };

        let driven = self.drive(&mut run, &mut pool, &extractor, started).await;
        pool.close().await;

        match driven {
            Ok(stop_reason) => {
                run.transition(CrawlState::Completed);
                tracing::info!(
                    "Crawl completed ({:?}): {} page(s) recorded, {} visited, {} failed in {:?}",
                    stop_reason,
                    run.entries.len(),
                    run.visited.len(),
                    run.failed,
                    started.elapsed()
                );
                Ok(CrawlReport {
                    visited: run.visited.len(),
                    failed: run.failed,
                    entries: run.entries,
                    stop_reason,
                    elapsed: started.elapsed(),
                })
            }
            Err(e) => {
                run.transition(CrawlState::Aborted);
                tracing::error!("Crawl aborted after {} page(s): {}", run.entries.len(), e);
                Err(e.into())
            }
        }
    }

    async fn drive(
        &self,
        run: &mut CrawlRun,
        pool: &mut PagePool,
        extractor: &LinkExtractor,
        started: Instant,
    ) -> Result<StopReason, BrowserError> {
        loop {
            if run.queue.is_empty() {
                return Ok(StopReason::QueueEmpty);
            }

            let remaining = run.remaining(self.website.max_pages);
            if remaining == 0 {
                return Ok(StopReason::MaxPages);
            }

            if started.elapsed() >= self.settings.max_duration {
                tracing::warn!(
                    "Crawl time limit {:?} reached with {} URL(s) queued",
                    self.settings.max_duration,
                    run.queue.len()
                );
                return Ok(StopReason::TimeLimit);
            }

            let batch = run.next_batch(pool.size().min(remaining));
            if batch.is_empty() {
                continue;
            }

            let visits = join_all(
                batch
                    .iter()
                    .zip(pool.pages_mut().iter_mut())
                    .map(|(task, page)| self.visit(page.as_mut(), task, extractor)),
            )
            .await;

            for (task, visit) in batch.into_iter().zip(visits) {
                run.absorb(task, visit?, extractor);
            }

            tracing::debug!(
                "{} page(s) recorded, {} queued",
                run.entries.len(),
                run.queue.len()
            );

            let crawl_delay = self.website.crawl_delay();
            if !run.queue.is_empty() && !crawl_delay.is_zero() {
                tokio::time::sleep(crawl_delay).await;
            }
        }
    }

    /// Navigates one task; only session failures escape as errors
    async fn visit(
        &self,
        page: &mut dyn Page,
        task: &CrawlTask,
        extractor: &LinkExtractor,
    ) -> Result<Visit, BrowserError> {
        tracing::debug!("Visiting [depth {}] {}", task.depth, task.url);

        let loaded = async {
            let navigation = page.navigate(task.url.as_str(), self.settings.timeout).await?;
            page.wait_for_stable_load().await?;
            let timestamp = now_iso8601();

            let final_url = extractor
                .normalize(navigation.final_url.clone())
                .ok_or_else(|| {
                    BrowserError::navigation(
                        task.url.as_str(),
                        format!("navigation ended on {}", navigation.final_url),
                    )
                })?;

            let links = if final_url == task.url && task.depth < self.website.max_depth {
                page.extract_links().await?
            } else {
                Vec::new()
            };

            Ok::<_, BrowserError>(Visit::Loaded {
                navigation,
                final_url,
                links,
                timestamp,
            })
        }
        .await;

        match loaded {
            Ok(visit) => Ok(visit),
            Err(e) if e.is_session_failure() => Err(e),
            Err(e) => Ok(Visit::Failed(e)),
        }
    }
}
