//! Licensing-Crawler main entry point
//!
//! This is the command-line interface for the licensing crawler.

use anyhow::Context;
use clap::Parser;
use licensing_crawler::config::{load_config_with_hash, Config};
use licensing_crawler::crawler::{CrawlRun, RefreshReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Licensing-Crawler: assembles the topic, procedure, region and branch tree
/// of a licensing service.
#[derive(Parser, Debug)]
#[command(name = "licensing-crawler")]
#[command(version)]
#[command(about = "Crawls a licensing service into a topic tree", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Identifier recorded on the crawl run
    #[arg(long, default_value_t = 1)]
    run_id: i64,

    /// Validate config and show the endpoints without crawling
    #[arg(long)]
    dry_run: bool,

    /// Do not run the procedure refresh
    #[arg(long)]
    skip_procedures: bool,

    /// Do not run the branch refresh
    #[arg(long)]
    skip_branches: bool,

    /// Print the assembled tree as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let run = handle_crawl(&cli, config, config_hash).await?;

    if cli.json {
        let tree = serde_json::to_string_pretty(&run).context("Failed to serialize crawl tree")?;
        println!("{}", tree);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("licensing_crawler=info,warn"),
            1 => EnvFilter::new("licensing_crawler=debug,info"),
            2 => EnvFilter::new("licensing_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows what would be requested
fn print_dry_run(config: &Config) {
    println!("=== Licensing-Crawler Dry Run ===\n");

    println!("Endpoints:");
    println!("  Topics:     POST {}", config.service.topics_url());
    println!("  Procedures: POST {}", config.service.procedures_url());
    println!("  Branches:   POST {}", config.service.branches_url());
    println!("  Service id: {}", config.service.service_id);

    println!("\nRegions ({}):", config.service.regions.len());
    for region in &config.service.regions {
        println!("  - {} {}", region.id, region.name);
    }

    println!("\nClient:");
    println!("  Verify TLS: {}", config.client.verify_tls);
    println!("  Timeout: {}s", config.client.timeout_secs);
    println!("  User agent: {}", config.client.user_agent);

    println!("\nCrawler:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Failure policy: {:?}", config.crawler.failure_policy);

    println!("\n✓ Configuration is valid");
}

/// Runs construction and the requested refresh passes in order
async fn handle_crawl(cli: &Cli, config: Config, config_hash: String) -> anyhow::Result<CrawlRun> {
    let mut run = CrawlRun::from_config_with_hash(cli.run_id, config, Some(config_hash))
        .await
        .context("Crawl run could not be created")?;

    if !cli.skip_procedures {
        let report = run
            .refresh_procedures()
            .await
            .context("Procedures refresh failed")?;
        log_report(&report);
    }

    if !cli.skip_branches {
        let report = run
            .refresh_branches()
            .await
            .context("Branches refresh failed")?;
        log_report(&report);
    }

    tracing::info!("Crawl run {} assembled: {}", run.id(), run.stats());
    Ok(run)
}

fn log_report(report: &RefreshReport) {
    if report.is_complete() {
        tracing::info!(
            "{} refresh fetched {} units ({} already populated)",
            report.pass,
            report.succeeded(),
            report.skipped
        );
    } else {
        tracing::warn!(
            "{} refresh left {} of {} units unpopulated",
            report.pass,
            report.failures.len(),
            report.attempted
        );
    }
}
