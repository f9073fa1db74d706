//! Offset-based listing pagination.
//!
//! Walks the listing endpoint strictly sequentially: the short-page and
//! empty-page exhaustion signals only make sense when offsets are fetched in
//! order, so pages are never parallelized.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::client::ApiResult;
use crate::crawler::{CrawlError, CrawlResult, INTER_PAGE_PAUSE_MS, MAX_PAGES};
use crate::Post;

/// Collect every post the listing will yield.
///
/// Starting at offset 0, fetches pages of `page_size` via `fetch_page`
/// (called with the current offset). An empty page or a short page
/// (`len < page_size`) terminates the walk; a full page advances the offset
/// and continues after a brief pause. Offsets increase monotonically, so the
/// loop terminates on any finite listing.
///
/// # Errors
/// Any page fetch failure aborts the crawl as [`CrawlError::Listing`];
/// exceeding [`MAX_PAGES`] aborts as [`CrawlError::PageLimitExceeded`].
pub async fn paginate_posts<F, Fut>(page_size: usize, fetch_page: F) -> CrawlResult<Vec<Post>>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = ApiResult<Vec<Post>>>,
{
    let mut all_posts = Vec::new();
    let mut offset = 0;
    let mut page_no = 0;

    loop {
        if page_no >= MAX_PAGES {
            return Err(CrawlError::PageLimitExceeded(MAX_PAGES));
        }

        debug!(offset, page = page_no + 1, "fetching listing page");
        let page = fetch_page(offset).await.map_err(CrawlError::Listing)?;

        if page.is_empty() {
            debug!(total = all_posts.len(), "listing exhausted: empty page");
            break;
        }

        let short_page = page.len() < page_size;
        debug!(received = page.len(), offset, "listing page received");
        all_posts.extend(page);

        if short_page {
            debug!(total = all_posts.len(), "listing exhausted: short page");
            break;
        }

        offset += page_size;
        page_no += 1;
        sleep(Duration::from_millis(INTER_PAGE_PAUSE_MS)).await;
    }

    Ok(all_posts)
}
