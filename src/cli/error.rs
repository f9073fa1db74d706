//! CLI error types and conversions

use crate::client::ApiError;
use crate::config::ConfigError;
use crate::crawler::CrawlError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// API error
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Crawl error
    #[error("crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Output error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
