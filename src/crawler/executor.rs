//! Crawl executor: full-crawl orchestration.
//!
//! Listing first, then detail fetches, then flattening:
//!
//! 1. Fetch the submolt side listing (non-fatal on failure)
//! 2. Walk the post listing to exhaustion (fatal on failure)
//! 3. Fetch detail for every post with comments through the bounded pool
//! 4. Flatten each fetched comment tree into parent-linked records

use tracing::{info, warn};

use crate::client::{MoltbookClient, SortOrder};
use crate::crawler::{
    fetch_all, flatten_comments, paginate_posts, pool::partition_results, CrawlOutcome,
    CrawlResult, PAGE_SIZE, WORKER_COUNT,
};
use crate::shutdown::SharedShutdown;

/// Orchestrates one complete crawl into a [`CrawlOutcome`].
pub struct CrawlExecutor {
    sort: SortOrder,
    submolt: Option<String>,
    page_size: usize,
    worker_count: usize,
    shutdown: Option<SharedShutdown>,
}

impl CrawlExecutor {
    /// Create an executor with default tuning.
    pub fn new() -> Self {
        Self {
            sort: SortOrder::New,
            submolt: None,
            page_size: PAGE_SIZE,
            worker_count: WORKER_COUNT,
            shutdown: None,
        }
    }

    /// Set the listing sort order.
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Restrict the listing to a single submolt.
    pub fn with_submolt(mut self, submolt: impl Into<String>) -> Self {
        self.submolt = Some(submolt.into());
        self
    }

    /// Set the listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the number of concurrent detail-fetch workers.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    /// Attach a cancellation handle checked between requests.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run the crawl.
    ///
    /// # Errors
    /// Returns [`crate::crawler::CrawlError`] only when the post listing
    /// itself cannot be retrieved; per-post detail failures are recorded in
    /// the outcome instead.
    pub async fn crawl(&self, client: &MoltbookClient) -> CrawlResult<CrawlOutcome> {
        let span = tracing::info_span!(
            "crawl",
            sort = %self.sort,
            submolt = self.submolt.as_deref().unwrap_or(""),
            page_size = self.page_size,
            workers = self.worker_count,
        );
        let _enter = span.enter();

        let submolts = match client.get_submolts().await {
            Ok(submolts) => {
                info!(count = submolts.len(), "submolt side listing fetched");
                submolts
            }
            Err(e) => {
                // Side listing is not load-bearing for the crawl.
                warn!(error = %e, "submolt listing failed, continuing without it");
                Vec::new()
            }
        };

        let posts = paginate_posts(self.page_size, |offset| {
            client.get_posts(self.sort, self.submolt.as_deref(), self.page_size, offset)
        })
        .await?;
        info!(count = posts.len(), "post listing collected");

        let detail_ids: Vec<String> = posts
            .iter()
            .filter(|p| p.has_comments())
            .map(|p| p.id.clone())
            .collect();
        info!(count = detail_ids.len(), "posts queued for detail fetch");

        let detail_results = fetch_all(
            detail_ids,
            self.worker_count,
            self.shutdown.as_deref(),
            |id| async move { client.get_post(&id).await },
        )
        .await;
        let (details, failures) = partition_results(detail_results);

        // Merge in listing order so the aggregate is stable across runs.
        let mut comments = Vec::new();
        for post in &posts {
            if let Some(detail) = details.get(&post.id) {
                comments.extend(flatten_comments(detail));
            }
        }

        info!(
            posts = posts.len(),
            comments = comments.len(),
            submolts = submolts.len(),
            failed = failures.len(),
            "crawl complete"
        );

        Ok(CrawlOutcome {
            posts,
            comments,
            submolts,
            failures,
        })
    }
}

impl Default for CrawlExecutor {
    fn default() -> Self {
        Self::new()
    }
}
