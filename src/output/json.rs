use crate::output::{write_file, AuditReport, OutputError, OutputResult};
use std::path::Path;

/// Serializes the report as pretty-printed JSON
///
/// Shape: `{ configHash, generatedAt, pages: SitemapEntry[], results: TestResults }`
pub fn format_json_report(report: &AuditReport<'_>) -> OutputResult<String> {
    serde_json::to_string_pretty(report).map_err(|e| OutputError::Format(e.to_string()))
}

pub fn write_json_report(report: &AuditReport<'_>, output_path: &Path) -> OutputResult<()> {
    write_file(output_path, &format_json_report(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{TestOutcome, TestResults, TestSummary};
    use crate::sitemap::SitemapEntry;
    use url::Url;

    #[test]
    fn test_json_report_shape() {
        let pages = vec![SitemapEntry::from_url(&Url::parse("https://x.test/a").unwrap())];
        let mut summary = TestSummary::new(1);
        summary.complete();
        let results = TestResults {
            summary,
            violations: vec![TestOutcome::error(
                "https://x.test/a",
                "2024-01-01T00:00:00.000Z".to_string(),
                "Navigation timeout",
            )],
        };
        let report = AuditReport {
            config_hash: "abc123",
            generated_at: "2024-01-01T00:00:01.000Z".to_string(),
            pages: &pages,
            results: &results,
        };

        let json = format_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["configHash"], "abc123");
        assert_eq!(value["pages"][0]["slug"], "a");
        assert_eq!(value["results"]["summary"]["totalPages"], 1);
        assert_eq!(value["results"]["violations"][0]["error"], "Navigation timeout");
    }
}
