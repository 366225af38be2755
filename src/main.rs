//! Review-Ripple main entry point
//!
//! This is the command-line interface for the Review-Ripple review harvester.

use anyhow::Context;
use clap::Parser;
use review_ripple::config::load_config_or_default;
use review_ripple::crawler::{crawl, CrawlMode, Coordinator};
use review_ripple::output::summarize_store;
use review_ripple::storage::open_storage;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Review-Ripple: a polite product review harvester
///
/// Fetches the reviews of products found by a keyword search, or listed in a
/// file, and saves them as one JSON file per product. Products that already
/// have a file are skipped.
#[derive(Parser, Debug)]
#[command(name = "review-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A polite product review harvester", long_about = None)]
struct Cli {
    /// Keyword to search for
    #[arg(short, long, value_name = "KEYWORD")]
    search: Option<String>,

    /// File with one product id per line (takes precedence over --search)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the review files (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let store = open_storage(&output_dir)
        .with_context(|| format!("preparing output directory {}", output_dir.display()))?;

    let mode = CrawlMode::select(cli.search, cli.input, &config.search.default_keyword);
    let mut coordinator = Coordinator::new(&config, store)?;

    if let Err(e) = crawl(&mut coordinator, &mode).await {
        tracing::error!("Crawl failed: {}", e);
        coordinator.stats().log();
        return Err(e.into());
    }

    match summarize_store(coordinator.store()) {
        Ok(summary) => tracing::info!(
            "{} now holds {} products, {} reviews",
            output_dir.display(),
            summary.products,
            summary.reviews
        ),
        Err(e) => tracing::warn!("Could not summarize {}: {}", output_dir.display(), e),
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("review_ripple=info,warn"),
            1 => EnvFilter::new("review_ripple=debug,info"),
            2 => EnvFilter::new("review_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
