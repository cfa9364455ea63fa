//! Markdown summary generation
//!
//! Renders a human-readable summary of a test run: totals, findings by
//! impact, pages with findings, and pages that could not be tested.

use crate::audit::{Impact, OutcomeClass};
use crate::output::{write_file, AuditReport, OutputResult};
use std::path::Path;

/// Pages listed in full before the rest is summarized
const MAX_LISTED_PAGES: usize = 100;

/// Writes the markdown summary to `output_path`
pub fn write_markdown_report(report: &AuditReport<'_>, output_path: &Path) -> OutputResult<()> {
    write_file(output_path, &format_markdown_report(report))
}

/// Formats a report as markdown
pub fn format_markdown_report(report: &AuditReport<'_>) -> String {
    let results = report.results;
    let summary = &results.summary;
    let mut md = String::new();

    md.push_str("# Sumi-Lens Accessibility Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Generated**: {}\n", report.generated_at));
    md.push_str(&format!("- **Completed**: {}\n", summary.completed_at));
    md.push_str(&format!("- **Config Hash**: {}\n", report.config_hash));
    md.push_str(&format!("- **Pages Discovered**: {}\n\n", report.pages.len()));

    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages Tested | {} |\n", summary.total_pages));
    md.push_str(&format!(
        "| Pages With Violations | {} |\n",
        summary.pages_with_violations
    ));
    md.push_str(&format!(
        "| Total Violations | {} |\n",
        summary.total_violations
    ));
    md.push_str(&format!("| Pages With Errors | {} |\n\n", results.errors().count()));

    if summary.total_violations > 0 {
        md.push_str("## Violations by Impact\n\n");
        md.push_str("| Impact | Violations |\n");
        md.push_str("|--------|------------|\n");
        for (impact, count) in results.impact_counts() {
            md.push_str(&format!("| {} | {} |\n", impact, count));
        }
        md.push('\n');
    }

    let with_findings: Vec<_> = results
        .violations
        .iter()
        .filter(|o| o.class() == OutcomeClass::HasFindings)
        .collect();

    if !with_findings.is_empty() {
        md.push_str("## Pages With Violations\n\n");

        for outcome in with_findings.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("### {}\n\n", outcome.url));
            md.push_str("| Rule | Impact | Nodes | Description |\n");
            md.push_str("|------|--------|-------|-------------|\n");

            let mut findings: Vec<_> = outcome.findings().unwrap_or_default().iter().collect();
            findings.sort_by_key(|f| f.impact);

            for finding in findings {
                md.push_str(&format!(
                    "| [{}]({}) | {} | {} | {} |\n",
                    finding.id,
                    finding.help_url,
                    impact_label(finding.impact),
                    finding.nodes.len(),
                    escape_cell(&finding.description)
                ));
            }
            md.push('\n');
        }

        if with_findings.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "... and {} more\n\n",
                with_findings.len() - MAX_LISTED_PAGES
            ));
        }
    }

    let errors: Vec<_> = results.errors().collect();
    if !errors.is_empty() {
        md.push_str("## Pages Not Tested\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");

        for outcome in errors {
            md.push_str(&format!(
                "| {} | {} |\n",
                outcome.url,
                escape_cell(outcome.error_message().unwrap_or_default())
            ));
        }
        md.push('\n');
    }

    md
}

fn impact_label(impact: Impact) -> &'static str {
    match impact {
        Impact::Critical => "**critical**",
        Impact::Serious => "serious",
        Impact::Moderate => "moderate",
        Impact::Minor => "minor",
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Finding, TestOutcome, TestResults, TestSummary};

    fn finding(id: &str, impact: Impact) -> Finding {
        Finding {
            id: id.to_string(),
            impact,
            description: "Elements must | have sufficient contrast".to_string(),
            help_url: format!("https://dequeuniversity.com/rules/axe/4.10/{}", id),
            nodes: Vec::new(),
        }
    }

    fn create_test_results() -> TestResults {
        let ts = "2024-01-01T00:00:00.000Z".to_string();
        let violations = vec![
            TestOutcome::violations(
                "https://x.test/a",
                ts.clone(),
                vec![
                    finding("color-contrast", Impact::Serious),
                    finding("image-alt", Impact::Critical),
                ],
            ),
            TestOutcome::violations("https://x.test/clean", ts.clone(), vec![]),
            TestOutcome::error("https://x.test/b", ts, "Navigation timeout"),
        ];
        let mut summary = TestSummary::new(violations.len());
        summary.record_chunk(&violations);
        summary.complete();
        TestResults {
            summary,
            violations,
        }
    }

    fn render(results: &TestResults) -> String {
        format_markdown_report(&AuditReport {
            config_hash: "abc123",
            generated_at: "2024-01-01T00:00:05.000Z".to_string(),
            pages: &[],
            results,
        })
    }

    #[test]
    fn test_format_markdown_report() {
        let markdown = render(&create_test_results());

        assert!(markdown.contains("# Sumi-Lens Accessibility Report"));
        assert!(markdown.contains("Config Hash**: abc123"));
        assert!(markdown.contains("| Pages Tested | 3 |"));
        assert!(markdown.contains("| Pages With Violations | 1 |"));
        assert!(markdown.contains("| Total Violations | 2 |"));
        assert!(markdown.contains("| Pages With Errors | 1 |"));
    }

    #[test]
    fn test_findings_sorted_by_impact() {
        let markdown = render(&create_test_results());

        let critical = markdown.find("image-alt").unwrap();
        let serious = markdown.find("color-contrast").unwrap();
        assert!(critical < serious);
        assert!(markdown.contains("must \\| have"));
        assert!(!markdown.contains("### https://x.test/clean"));
    }

    #[test]
    fn test_errors_listed() {
        let markdown = render(&create_test_results());
        assert!(markdown.contains("## Pages Not Tested"));
        assert!(markdown.contains("| https://x.test/b | Navigation timeout |"));
    }

    #[test]
    fn test_clean_run_has_no_finding_sections() {
        let results = TestResults {
            summary: TestSummary::new(0),
            violations: Vec::new(),
        };
        let markdown = render(&results);
        assert!(!markdown.contains("Violations by Impact"));
        assert!(!markdown.contains("Pages Not Tested"));
    }
}
