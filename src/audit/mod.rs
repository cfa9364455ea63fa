//! Accessibility auditing
//!
//! This module contains:
//! - The result data model (`TestOutcome`, `Finding`, `TestResults`)
//! - The accessibility-evaluation capability and its axe-core engine
//! - The chunked, pool-bounded test executor
//! - Progress reporters

mod engine;
mod executor;
mod model;
mod progress;

pub use engine::{AccessibilityEngine, AxeEngine, WCAG_TAGS};
pub use executor::{ExecutorSettings, TestExecutor};
pub use model::{
    AuditResult, Finding, FindingNode, Impact, OutcomeClass, TestOutcome, TestResults, TestSummary,
};
pub use progress::{BarProgress, NoProgress, PageProgress, ProgressReporter, TracingProgress};
