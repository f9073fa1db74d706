//! CLI command implementations

pub mod crawl;
pub mod error;
pub mod submolts;

pub use crawl::{Cli, Commands, CrawlArgs};
pub use error::CliError;
pub use submolts::SubmoltsArgs;
