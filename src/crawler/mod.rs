//! Crawl orchestration.
//!
//! A crawl walks the post listing to exhaustion ([`pagination`]), fetches the
//! comment tree for every post that has one through a bounded worker pool
//! ([`pool`]), flattens each tree into parent-linked records ([`flatten`]),
//! and assembles the aggregate [`CrawlOutcome`] ([`executor`]).
//!
//! # Failure Semantics
//!
//! A listing fetch failure aborts the whole crawl: later pages cannot be
//! reasoned about without it. A per-post detail failure is recorded against
//! that post's id and never aborts the batch; the caller decides whether to
//! re-run over the failed subset.

pub mod executor;
pub mod flatten;
pub mod pagination;
pub mod pool;

use std::collections::HashMap;

pub use executor::CrawlExecutor;
pub use flatten::flatten_comments;
pub use pagination::paginate_posts;
pub use pool::fetch_all;

use crate::client::ApiError;
use crate::{FlatComment, Post, Submolt};

/// Default listing page size.
pub const PAGE_SIZE: usize = 100;

/// Default number of concurrent detail-fetch workers.
pub const WORKER_COUNT: usize = 20;

/// Hard ceiling on listing pages, guarding against a listing that never
/// terminates.
pub const MAX_PAGES: usize = 10_000;

/// Pause between sequential listing pages. The rate limiter already
/// throttles; this only smooths burstiness.
pub const INTER_PAGE_PAUSE_MS: u64 = 100;

/// Crawl failures
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The post listing could not be retrieved; fatal to the crawl
    #[error("listing fetch failed: {0}")]
    Listing(#[source] ApiError),

    /// The listing produced more pages than the configured ceiling
    #[error("listing exceeded {0} pages without terminating")]
    PageLimitExceeded(usize),
}

/// Result type for crawl operations
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Aggregate result of one crawl invocation.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Every post the listing yielded, in listing order
    pub posts: Vec<Post>,
    /// Flattened comment records across all fetched posts
    pub comments: Vec<FlatComment>,
    /// Submolt side listing (empty if the side fetch failed)
    pub submolts: Vec<Submolt>,
    /// Per-post detail failures, keyed by post id
    pub failures: HashMap<String, ApiError>,
}

impl CrawlOutcome {
    /// Whether every requested detail fetch succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
