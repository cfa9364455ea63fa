//! Sumi-Lens main entry point
//!
//! This is the command-line interface for the Sumi-Lens accessibility auditor.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_lens::audit::{BarProgress, NoProgress, ProgressReporter, TestResults, TracingProgress};
use sumi_lens::config::{load_config_with_hash, Config};
use sumi_lens::pipeline::{run_discovery, run_pipeline, PipelineOptions};
use tracing_subscriber::EnvFilter;

/// Sumi-Lens: a sitemap-driven accessibility auditor
///
/// Sumi-Lens discovers a site's pages from its sitemaps or by following
/// same-host links, audits every page against the WCAG 2.1 A/AA rules,
/// and writes JSON and markdown reports.
#[derive(Parser, Debug)]
#[command(name = "sumi-lens")]
#[command(version)]
#[command(about = "A sitemap-driven accessibility auditor", long_about = None)]
struct Cli {
    /// Path to TOML (or JSON) configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be audited without auditing
    #[arg(long, conflicts_with = "discover_only")]
    dry_run: bool,

    /// Discover pages, print them as JSON and exit
    #[arg(long, conflicts_with = "dry_run")]
    discover_only: bool,

    /// Write reports here instead of the configured directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Report progress as log lines instead of a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.discover_only {
        handle_discover_only(&config).await?;
    } else {
        let results = handle_audit(&cli, &config, config_hash).await?;
        if results.summary.pages_with_violations > 0 {
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_lens=info,warn"),
            1 => EnvFilter::new("sumi_lens=debug,info"),
            2 => EnvFilter::new("sumi_lens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Lens Dry Run ===\n");

    println!("Scan:");
    println!("  Timeout: {}ms", config.scan.timeout);
    println!("  Retries: {} (every {}ms)", config.scan.max_retries, config.scan.retry_delay);
    println!("  Concurrent pages: {}", config.scan.concurrent);
    println!("  Settle delay: {}ms", config.scan.wait_for_timeout);
    println!("  Chunk delay: {}ms", config.scan.chunk_delay);
    println!("  Discovery limit: {}s", config.scan.max_duration);

    if !config.sitemaps.is_empty() {
        println!("\nSitemaps ({}):", config.sitemaps.len());
        for (name, location) in &config.sitemaps {
            println!("  - {}: {}", name, location);
        }
    }

    if let Some(website) = &config.website {
        let ignored = if config.sitemaps.is_empty() { "" } else { " (ignored, sitemaps win)" };
        println!("\nWebsite{}:", ignored);
        println!("  Base URL: {}", website.base_url);
        println!("  Max depth: {}", website.max_depth);
        match website.max_pages {
            Some(max) => println!("  Max pages: {}", max),
            None => println!("  Max pages: unbounded"),
        }
        println!("  Exclude: {:?}", website.exclude_patterns);
        println!("  Include: {:?}", website.include_patterns);
    }

    println!("\nBrowser:");
    println!("  Backend: {:?}", config.browser.backend);
    println!("  Headless: {}", config.browser.headless);
    if let Some(executable) = &config.browser.executable {
        println!("  Executable: {}", executable);
    }

    println!("\nAxe script: {}", config.axe.script);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Formats: {}", config.output.formats.join(", "));

    println!("\n✓ Configuration is valid");
}

/// Handles the --discover-only mode: prints the discovered pages as JSON
async fn handle_discover_only(config: &Config) -> Result<()> {
    let pages = run_discovery(config).await.context("Discovery failed")?;
    tracing::info!("Discovered {} page(s)", pages.len());
    println!("{}", serde_json::to_string_pretty(&pages)?);
    Ok(())
}

/// Handles the main audit run
async fn handle_audit(cli: &Cli, config: &Config, config_hash: String) -> Result<TestResults> {
    let progress: Arc<dyn ProgressReporter> = if cli.quiet {
        Arc::new(NoProgress)
    } else if cli.no_progress {
        Arc::new(TracingProgress)
    } else {
        Arc::new(BarProgress::new())
    };

    let options = PipelineOptions {
        verbose: cli.verbose > 0,
        progress,
        output_dir: cli.output.clone(),
        config_hash,
    };

    let output = match run_pipeline(config, options).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            return Err(e).context("Audit failed");
        }
    };

    let summary = &output.results.summary;
    println!("\n=== Audit Summary ===\n");
    println!("Pages discovered:      {}", output.pages.len());
    println!("Pages tested:          {}", summary.total_pages);
    println!("Pages with violations: {}", summary.pages_with_violations);
    println!("Total violations:      {}", summary.total_violations);
    println!("Pages with errors:     {}", output.results.errors().count());
    for path in &output.reports {
        println!("✓ Report written to: {}", path.display());
    }

    Ok(output.results)
}
