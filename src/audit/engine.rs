//! Accessibility-evaluation capability
//!
//! [`AxeEngine`] injects axe-core into a loaded page and runs it restricted
//! to a rule-tag set.

use crate::audit::model::{Finding, FindingNode, Impact};
use crate::browser::{BrowserError, Page};
use crate::sitemap::ContentFetcher;
use crate::LensError;
use async_trait::async_trait;
use serde::Deserialize;

/// Rule tags every audit is restricted to
pub const WCAG_TAGS: [&str; 4] = ["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"];

/// Separator used when flattening selectors that cross frames or shadow roots
const NESTED_TARGET_SEPARATOR: &str = " >>> ";

/// Evaluates accessibility rules against a loaded page
#[async_trait]
pub trait AccessibilityEngine: Send + Sync {
    /// Runs the rules tagged with any of `tags` and returns the findings
    async fn run_rules(
        &self,
        page: &mut dyn Page,
        tags: &[&str],
    ) -> Result<Vec<Finding>, BrowserError>;
}

/// axe-core based engine
pub struct AxeEngine {
    source: String,
}

impl AxeEngine {
    /// Uses already-loaded axe-core source
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Loads axe-core from a URL or a local path
    ///
    /// # Returns
    ///
    /// * `Ok(AxeEngine)` - Script loaded
    /// * `Err(LensError::Engine)` - The script could not be read or is empty
    pub async fn load(fetcher: &ContentFetcher, location: &str) -> Result<Self, LensError> {
        tracing::info!("Loading axe-core from {}", location);
        let source = fetcher
            .fetch(location)
            .await
            .map_err(|e| LensError::Engine(e.to_string()))?;

        if source.trim().is_empty() {
            return Err(LensError::Engine(format!("{} is empty", location)));
        }

        Ok(Self::from_source(source))
    }

    fn run_script(tags: &[&str]) -> String {
        let tags = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
        format!(
            "axe.run(document, {{ runOnly: {{ type: 'tag', values: {} }}, \
             resultTypes: ['violations'] }})\
             .then(results => results.violations)",
            tags
        )
    }
}

#[async_trait]
impl AccessibilityEngine for AxeEngine {
    async fn run_rules(
        &self,
        page: &mut dyn Page,
        tags: &[&str],
    ) -> Result<Vec<Finding>, BrowserError> {
        let loaded = page.evaluate("typeof window.axe !== 'undefined'").await?;
        if loaded != serde_json::Value::Bool(true) {
            page.evaluate(&format!("{}\n;true", self.source)).await?;
        }

        let raw = page.evaluate(&Self::run_script(tags)).await?;
        let violations: Vec<AxeViolation> = serde_json::from_value(raw)
            .map_err(|e| BrowserError::Evaluation(format!("unexpected axe result: {}", e)))?;

        Ok(violations.into_iter().map(Finding::from).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeViolation {
    id: String,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    help_url: String,
    #[serde(default)]
    nodes: Vec<AxeNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeNode {
    #[serde(default)]
    html: String,
    #[serde(default)]
    failure_summary: Option<String>,
    #[serde(default)]
    target: Vec<AxeSelector>,
}

/// A selector, or a selector path through iframes/shadow roots
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AxeSelector {
    Single(String),
    Nested(Vec<AxeSelector>),
}

impl AxeSelector {
    fn flatten(self) -> String {
        match self {
            AxeSelector::Single(s) => s,
            AxeSelector::Nested(parts) => parts
                .into_iter()
                .map(AxeSelector::flatten)
                .collect::<Vec<_>>()
                .join(NESTED_TARGET_SEPARATOR),
        }
    }
}

impl From<AxeViolation> for Finding {
    fn from(raw: AxeViolation) -> Self {
        let impact = match raw.impact.as_deref().map(str::parse::<Impact>) {
            Some(Ok(impact)) => impact,
            _ => {
                tracing::debug!(
                    "Rule {} reported impact {:?}; treating as minor",
                    raw.id,
                    raw.impact
                );
                Impact::Minor
            }
        };

        Finding {
            id: raw.id,
            impact,
            description: raw.description,
            help_url: raw.help_url,
            nodes: raw
                .nodes
                .into_iter()
                .map(|node| FindingNode {
                    html: node.html,
                    failure_summary: node.failure_summary.unwrap_or_default(),
                    target: node.target.into_iter().map(AxeSelector::flatten).collect(),
                })
                .collect(),
        }
    }
}
