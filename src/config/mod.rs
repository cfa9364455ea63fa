//! Configuration module for Sumi-Lens
//!
//! This module handles loading, parsing, and validating TOML (or JSON)
//! configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_lens::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lens.toml")).unwrap();
//! println!("Pages audited in parallel: {}", config.scan.concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AxeConfig, BrowserBackend, BrowserConfig, Config, OutputConfig, ScanConfig, WebsiteConfig,
    DEFAULT_AXE_SCRIPT,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_json_config,
    parse_toml_config,
};
pub use validation::{validate, validate_website_config};
