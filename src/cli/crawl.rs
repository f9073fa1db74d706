//! Crawl command implementation

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cli::{CliError, SubmoltsArgs};
use crate::client::{MoltbookClient, SortOrder};
use crate::config::ClientConfig;
use crate::crawler::{CrawlExecutor, PAGE_SIZE, WORKER_COUNT};
use crate::output::Snapshot;
use crate::shutdown::SharedShutdown;

/// Maximum allowed worker count, so a misconfigured run cannot hammer the
/// service even within the rate limiter's window.
const MAX_WORKERS: usize = 64;

fn parse_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("workers must be at least 1".to_string());
    }
    if value > MAX_WORKERS {
        return Err(format!("workers {value} exceeds maximum of {MAX_WORKERS}"));
    }
    Ok(value)
}

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(name = "moltbook-archiver")]
#[command(about = "Crawl and archive Moltbook posts and comment trees", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL override (defaults to the production endpoint)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 20)]
    pub timeout: u64,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Crawl the post listing and archive posts, comments, and submolts
    Crawl(CrawlArgs),
    /// List submolts
    Submolts(SubmoltsArgs),
}

/// Arguments for the crawl command.
#[derive(Debug, Parser)]
pub struct CrawlArgs {
    /// Listing sort order
    #[arg(long, value_enum, default_value_t = SortOrder::New)]
    pub sort: SortOrder,

    /// Restrict the crawl to one submolt
    #[arg(long)]
    pub submolt: Option<String>,

    /// Listing page size
    #[arg(long, default_value_t = PAGE_SIZE, value_parser = clap::value_parser!(usize))]
    pub page_size: usize,

    /// Concurrent detail-fetch workers
    #[arg(long, default_value_t = WORKER_COUNT, value_parser = parse_workers)]
    pub workers: usize,

    /// Output path for the snapshot JSON
    #[arg(long, default_value = "moltbook_data.json")]
    pub output: PathBuf,
}

impl CrawlArgs {
    /// Execute a full crawl and write the snapshot artifact.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let client = build_client(cli)?;

        let mut executor = CrawlExecutor::new()
            .with_sort(self.sort)
            .with_page_size(self.page_size)
            .with_worker_count(self.workers)
            .with_shutdown(shutdown);
        if let Some(submolt) = &self.submolt {
            executor = executor.with_submolt(submolt.clone());
        }

        let outcome = executor.crawl(&client).await?;
        if !outcome.is_complete() {
            for (post_id, error) in &outcome.failures {
                tracing::warn!(post_id = %post_id, error = %error, "post detail missing from snapshot");
            }
        }

        let snapshot = Snapshot::from_outcome(outcome);
        snapshot.write(&self.output)?;
        info!(path = %self.output.display(), "crawl snapshot saved");
        Ok(())
    }
}

/// Build an API client from CLI-level options plus environment credentials.
pub(crate) fn build_client(cli: &Cli) -> Result<MoltbookClient, CliError> {
    let mut config = ClientConfig::from_env()?.with_timeout(Duration::from_secs(cli.timeout));
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    Ok(MoltbookClient::new(&config)?)
}
