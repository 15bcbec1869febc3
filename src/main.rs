//! OSDI-Harvest main entry point
//!
//! This is the command-line interface for the OSDI-Harvest form harvester.

use anyhow::Context;
use clap::Parser;
use osdi_harvest::config::{load_config, Config};
use osdi_harvest::crawler::run_harvest;
use osdi_harvest::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// OSDI-Harvest: a form-submission harvester
///
/// Reads API_KEY and FORM_ID from the environment, walks every submissions
/// page of the form, keeps the newest submission per person, looks each
/// person up and writes a flat JSON dataset.
#[derive(Parser, Debug)]
#[command(name = "osdi-harvest")]
#[command(version)]
#[command(about = "Harvests form submissions into a flat JSON dataset", long_about = None)]
struct Cli {
    /// Optional TOML file with tunables (workers, timeouts, paths)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the dataset output path
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Override the diagnostic log path
    #[arg(long, value_name = "FILE")]
    debug_log: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show what would be harvested without any request
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, cli.quiet).await
}

/// Loads configuration and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;

    if let Some(output) = &cli.output {
        config.output.data_path = output.clone();
    }
    if let Some(debug_log) = &cli.debug_log {
        config.output.debug_log_path = debug_log.clone();
    }

    osdi_harvest::config::validate(&config).context("validating overrides")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("osdi_harvest=info,warn"),
            1 => EnvFilter::new("osdi_harvest=debug,info"),
            2 => EnvFilter::new("osdi_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== OSDI-Harvest Dry Run ===\n");

    println!("API:");
    println!("  First page: {}", config.api.submissions_url());
    println!("  Request timeout: {}s", config.api.request_timeout_secs);
    println!("  Connect timeout: {}s", config.api.connect_timeout_secs);

    println!("\nWorkers:");
    println!("  Pagination: {}", config.crawler.page_workers);
    println!("  Enrichment: {}", config.crawler.detail_workers);

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.data_path);
    println!("  Diagnostic log: {}", config.output.debug_log_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, quiet: bool) -> anyhow::Result<()> {
    println!("Fetching and processing Action Network data...");

    match run_harvest(config).await {
        Ok(report) => {
            println!(
                "Data successfully saved to {}!",
                report.output_path.display()
            );
            if !quiet {
                println!();
                print_statistics(&report.statistics);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
