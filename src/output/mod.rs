//! Report output
//!
//! This module handles:
//! - Selecting report writers from configured format names
//! - The JSON report (discovered pages plus test results)
//! - The markdown summary

mod json;
mod markdown;

pub use json::{format_json_report, write_json_report};
pub use markdown::{format_markdown_report, write_markdown_report};

use crate::audit::TestResults;
use crate::sitemap::SitemapEntry;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Json,
    Markdown,
}

impl ReportFormat {
    /// File name the report is written to inside the output directory
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Json => "report.json",
            ReportFormat::Markdown => "report.md",
        }
    }

    /// Parses every configured format name, failing on the first unknown one
    pub fn parse_all(names: &[String]) -> Result<Vec<ReportFormat>, String> {
        let mut formats = Vec::with_capacity(names.len());
        for name in names {
            let format = name.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Json => f.write_str("json"),
            ReportFormat::Markdown => f.write_str("markdown"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(format!(
                "unknown report format '{}' (expected \"json\" or \"markdown\")",
                other
            )),
        }
    }
}

/// Everything a report is rendered from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport<'a> {
    pub config_hash: &'a str,
    pub generated_at: String,
    pub pages: &'a [SitemapEntry],
    pub results: &'a TestResults,
}

/// Writes one report per format into `directory`, creating it if needed
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths written, in format order
/// * `Err(OutputError)` - The directory or a report could not be written
pub fn write_reports(
    directory: &Path,
    formats: &[ReportFormat],
    report: &AuditReport<'_>,
) -> OutputResult<Vec<PathBuf>> {
    std::fs::create_dir_all(directory).map_err(|source| OutputError::Write {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = directory.join(format.file_name());
        match format {
            ReportFormat::Json => write_json_report(report, &path)?,
            ReportFormat::Markdown => write_markdown_report(report, &path)?,
        }
        tracing::info!("Wrote {} report to {}", format, path.display());
        written.push(path);
    }

    Ok(written)
}

pub(crate) fn write_file(path: &Path, content: &str) -> OutputResult<()> {
    std::fs::write(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
