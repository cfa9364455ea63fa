//! Progress reporting for test runs
//!
//! Reporters only observe; nothing they do affects results.

use crate::audit::model::{OutcomeClass, TestSummary};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress of one finished page audit
#[derive(Debug, Clone)]
pub struct PageProgress<'a> {
    pub url: &'a str,
    pub class: OutcomeClass,
    /// Finding count (zero for errors)
    pub count: usize,
    /// Pages finished so far, including this one
    pub completed: usize,
    pub total: usize,
}

/// Observer of a test run
///
/// `on_page` may be called concurrently from the audits of one chunk.
pub trait ProgressReporter: Send + Sync {
    fn on_start(&self, _total: usize) {}

    fn on_page(&self, _progress: &PageProgress<'_>) {}

    fn on_finish(&self, _summary: &TestSummary) {}
}

/// Reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Reports through log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn on_start(&self, total: usize) {
        tracing::info!("Testing {} page(s)", total);
    }

    fn on_page(&self, p: &PageProgress<'_>) {
        match p.class {
            OutcomeClass::Error => {
                tracing::info!("[{}/{}] {} errored", p.completed, p.total, p.url)
            }
            OutcomeClass::Clean => {
                tracing::info!("[{}/{}] {} no violations", p.completed, p.total, p.url)
            }
            OutcomeClass::HasFindings => tracing::info!(
                "[{}/{}] {} {} violation(s)",
                p.completed,
                p.total,
                p.url,
                p.count
            ),
        }
    }

    fn on_finish(&self, summary: &TestSummary) {
        tracing::info!(
            "Tested {} page(s): {} with violations, {} violation(s) total",
            summary.total_pages,
            summary.pages_with_violations,
            summary.total_violations
        );
    }
}

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Terminal progress bar
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn on_page(&self, p: &PageProgress<'_>) {
        let status = match p.class {
            OutcomeClass::Error => "error".to_string(),
            OutcomeClass::Clean => "clean".to_string(),
            OutcomeClass::HasFindings => format!("{} violation(s)", p.count),
        };
        self.bar.set_message(format!("{} ({})", p.url, status));
        self.bar.set_position(p.completed as u64);
    }

    fn on_finish(&self, summary: &TestSummary) {
        self.bar.finish_with_message(format!(
            "{} page(s), {} violation(s)",
            summary.total_pages, summary.total_violations
        ));
    }
}
