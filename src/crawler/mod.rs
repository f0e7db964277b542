//! Crawler module for assembling the licensing tree
//!
//! This module contains the crawl orchestration, including:
//! - Run construction and the topic fetch
//! - Procedure and branch refresh passes
//! - Bounded, order-preserving fan-out of independent fetches
//! - Per-pass reports and failure policy

mod fanout;
mod report;
mod run;

pub use report::{FailedUnit, RefreshPass, RefreshReport};
pub use run::{CrawlRun, TreeStats};

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl
///
/// This is the main entry point for a one-shot crawl. It will:
/// 1. Build the HTTP client
/// 2. Create the run, fetching its topics
/// 3. Refresh procedures for every topic
/// 4. Generate regions and refresh branches for every topic
///
/// # Example
///
/// ```no_run
/// use licensing_crawler::config::load_config;
/// use licensing_crawler::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let run = crawl(1, config).await?;
/// println!("{}", run.stats());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(run_id: i64, config: Config) -> Result<CrawlRun, CrawlError> {
    let mut run = CrawlRun::from_config(run_id, config).await?;
    run.refresh_procedures().await?;
    run.refresh_branches().await?;
    Ok(run)
}
