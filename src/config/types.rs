use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Sumi-Lens
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    /// Link-following discovery settings
    #[serde(default)]
    pub website: Option<WebsiteConfig>,

    /// Sitemap name -> URL or local path
    #[serde(default)]
    pub sitemaps: BTreeMap<String, String>,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub axe: AxeConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings shared by sitemap discovery, crawl navigation and page testing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScanConfig {
    /// Per-fetch and per-navigation timeout (milliseconds)
    pub timeout: u64,

    /// Additional attempts after the first failed fetch
    pub max_retries: u32,

    /// Wait between retries (milliseconds)
    pub retry_delay: u64,

    /// Batch, chunk and page-pool size
    pub concurrent: usize,

    /// Extra settle time after the page has loaded (milliseconds)
    pub wait_for_timeout: u64,

    /// Pause between test chunks (milliseconds)
    pub chunk_delay: u64,

    /// Wall-clock ceiling for a discovery run (seconds)
    pub max_duration: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: 30_000,
            max_retries: 3,
            retry_delay: 5_000,
            concurrent: 2,
            wait_for_timeout: 0,
            chunk_delay: 1_000,
            max_duration: 300,
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn wait_for_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_for_timeout)
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration)
    }
}

/// Website (link-following) discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebsiteConfig {
    /// Page the crawl starts from; only links on its host are followed
    pub base_url: String,

    /// Maximum link depth from the base URL
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Stop after this many pages have been recorded (unbounded when absent)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Regular expressions; a matching URL is never followed
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regular expressions; when non-empty a URL must match one of them
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Pause between crawl batches (milliseconds)
    #[serde(default = "default_crawl_delay")]
    pub crawl_delay: u64,

    /// Drop query strings when normalising discovered links
    #[serde(default = "default_strip_query")]
    pub strip_query: bool,
}

fn default_max_depth() -> u32 {
    3
}

fn default_crawl_delay() -> u64 {
    1_000
}

fn default_strip_query() -> bool {
    true
}

impl WebsiteConfig {
    /// Creates a website configuration with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_depth: default_max_depth(),
            max_pages: None,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            crawl_delay: default_crawl_delay(),
            strip_query: default_strip_query(),
        }
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay)
    }
}

/// Which page-rendering backend drives navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserBackend {
    /// Plain HTTP fetch with static HTML parsing; cannot run page scripts
    #[default]
    Http,
    /// Headless Chromium over the DevTools protocol
    Chromium,
}

/// Browser launch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrowserConfig {
    pub backend: BrowserBackend,
    pub headless: bool,

    /// Explicit Chrome/Chromium executable; auto-detected when absent
    pub executable: Option<String>,

    /// User agent sent by the HTTP backend
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: BrowserBackend::Http,
            headless: true,
            executable: None,
            user_agent: format!("SumiLens/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Location of the axe-core script injected into audited pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AxeConfig {
    /// URL or local path of `axe.min.js`
    pub script: String,
}

pub const DEFAULT_AXE_SCRIPT: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.10.2/axe.min.js";

impl Default for AxeConfig {
    fn default() -> Self {
        Self {
            script: DEFAULT_AXE_SCRIPT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory reports are written into
    pub directory: String,

    /// Report formats, e.g. `["json", "markdown"]`
    pub formats: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./a11y-report".to_string(),
            formats: vec!["json".to_string()],
        }
    }
}
