//! Submolts listing command

use clap::Parser;

use crate::cli::crawl::{build_client, Cli};
use crate::cli::CliError;

/// Arguments for the submolts command.
#[derive(Debug, Parser)]
pub struct SubmoltsArgs {}

impl SubmoltsArgs {
    /// Fetch and print the submolt side listing.
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let client = build_client(cli)?;
        let submolts = client.get_submolts().await?;

        println!("{} submolts:", submolts.len());
        for submolt in submolts {
            println!(
                "  {:<24} {:>8} subscribers  {}",
                submolt.name, submolt.subscribers, submolt.display_name
            );
        }
        Ok(())
    }
}
