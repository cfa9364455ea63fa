//! Audit result data model
//!
//! Field names serialize in camelCase so reports match what downstream
//! renderers expect (`helpUrl`, `failureSummary`, `pagesWithViolations`, ...).

use crate::util::now_iso8601;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Impact {
    pub const ALL: [Impact; 4] = [
        Impact::Critical,
        Impact::Serious,
        Impact::Moderate,
        Impact::Minor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Critical => "critical",
            Impact::Serious => "serious",
            Impact::Moderate => "moderate",
            Impact::Minor => "minor",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Impact::Critical),
            "serious" => Ok(Impact::Serious),
            "moderate" => Ok(Impact::Moderate),
            "minor" => Ok(Impact::Minor),
            other => Err(format!("unknown impact '{}'", other)),
        }
    }
}

/// A DOM node affected by a finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingNode {
    pub html: String,
    pub failure_summary: String,
    /// CSS selectors locating the node
    pub target: Vec<String>,
}

/// A single accessibility rule failure on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub impact: Impact,
    pub description: String,
    pub help_url: String,
    pub nodes: Vec<FindingNode>,
}

/// What auditing one page produced: findings or an error, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    Violations(Vec<Finding>),
    Error(String),
}

/// Outcome class used for progress reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Error,
    Clean,
    HasFindings,
}

/// The result of auditing one URL
///
/// Serializes as `{url, timestamp, violations}` or `{url, timestamp, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub url: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub result: AuditResult,
}

impl TestOutcome {
    pub fn violations(url: impl Into<String>, timestamp: String, findings: Vec<Finding>) -> Self {
        Self {
            url: url.into(),
            timestamp,
            result: AuditResult::Violations(findings),
        }
    }

    pub fn error(url: impl Into<String>, timestamp: String, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp,
            result: AuditResult::Error(message.into()),
        }
    }

    /// Findings of a successful audit, `None` for an errored one
    pub fn findings(&self) -> Option<&[Finding]> {
        match &self.result {
            AuditResult::Violations(findings) => Some(findings),
            AuditResult::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            AuditResult::Violations(_) => None,
            AuditResult::Error(message) => Some(message),
        }
    }

    /// Number of findings; zero for errored outcomes
    pub fn finding_count(&self) -> usize {
        self.findings().map_or(0, <[Finding]>::len)
    }

    pub fn class(&self) -> OutcomeClass {
        match &self.result {
            AuditResult::Error(_) => OutcomeClass::Error,
            AuditResult::Violations(findings) if findings.is_empty() => OutcomeClass::Clean,
            AuditResult::Violations(_) => OutcomeClass::HasFindings,
        }
    }
}

/// Aggregate counters over a test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub total_pages: usize,
    pub pages_with_violations: usize,
    pub total_violations: usize,
    /// Stamped when the run completes
    pub completed_at: String,
}

impl TestSummary {
    /// Starts a summary for `total_pages` URLs
    pub fn new(total_pages: usize) -> Self {
        Self {
            total_pages,
            pages_with_violations: 0,
            total_violations: 0,
            completed_at: String::new(),
        }
    }

    /// Folds one settled chunk of outcomes into the counters
    pub fn record_chunk(&mut self, outcomes: &[TestOutcome]) {
        for outcome in outcomes {
            let count = outcome.finding_count();
            if count > 0 {
                self.pages_with_violations += 1;
                self.total_violations += count;
            }
        }
    }

    /// Stamps `completed_at` with the current time
    pub fn complete(&mut self) {
        self.completed_at = now_iso8601();
    }
}

/// Final result set of a test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub summary: TestSummary,
    /// One outcome per URL, in input order
    pub violations: Vec<TestOutcome>,
}

impl TestResults {
    /// Outcomes that errored
    pub fn errors(&self) -> impl Iterator<Item = &TestOutcome> {
        self.violations
            .iter()
            .filter(|o| o.class() == OutcomeClass::Error)
    }

    /// Finding count per impact level across all outcomes
    pub fn impact_counts(&self) -> [(Impact, usize); 4] {
        Impact::ALL.map(|impact| {
            let count = self
                .violations
                .iter()
                .filter_map(TestOutcome::findings)
                .flatten()
                .filter(|f| f.impact == impact)
                .count();
            (impact, count)
        })
    }
}
