use crate::config::types::{Config, OutputConfig, ScanConfig, WebsiteConfig};
use crate::output::ReportFormat;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Upper bound on pool size; each slot is a live browser page
const MAX_CONCURRENT: usize = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scan_config(&config.scan)?;

    if config.sitemaps.is_empty() && config.website.is_none() {
        return Err(ConfigError::Validation(
            "either [website] or [sitemaps] must be configured".to_string(),
        ));
    }

    if let Some(website) = &config.website {
        validate_website_config(website)?;
    }

    validate_sitemaps(config)?;
    validate_output_config(&config.output)?;

    if config.axe.script.trim().is_empty() {
        return Err(ConfigError::Validation(
            "axe script location cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates settings shared by discovery and testing
fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if config.concurrent < 1 || config.concurrent > MAX_CONCURRENT {
        return Err(ConfigError::Validation(format!(
            "concurrent must be between 1 and {}, got {}",
            MAX_CONCURRENT, config.concurrent
        )));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }

    if config.max_duration == 0 {
        return Err(ConfigError::Validation(
            "max-duration must be greater than 0s".to_string(),
        ));
    }

    Ok(())
}

/// Validates link-following discovery settings
pub fn validate_website_config(config: &WebsiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e))
    })?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1 when set".to_string(),
        ));
    }

    validate_patterns(&config.exclude_patterns)?;
    validate_patterns(&config.include_patterns)?;

    Ok(())
}

/// Checks that every pattern compiles as a regular expression
fn validate_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }
    Ok(())
}

/// Validates sitemap locations
fn validate_sitemaps(config: &Config) -> Result<(), ConfigError> {
    for (name, location) in &config.sitemaps {
        if location.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "sitemap '{}' has an empty location",
                name
            )));
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            Url::parse(location).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid sitemap URL '{}': {}", location, e))
            })?;
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    for format in &config.formats {
        format
            .parse::<ReportFormat>()
            .map_err(ConfigError::Validation)?;
    }

    Ok(())
}
