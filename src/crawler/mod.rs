//! Website (link-following) discovery
//!
//! This module contains:
//! - Link extraction and filtering against the base host and patterns
//! - The breadth-first crawl over a pool of browser pages

mod links;
mod website;

pub use links::LinkExtractor;
pub use website::{
    CrawlReport, CrawlSettings, CrawlState, CrawlTask, StopReason, WebsiteDiscovery, MAX_REDIRECTS,
};
