//! Bounded-concurrency detail fetching.
//!
//! Dispatches one fetch per item across at most `worker_count` in-flight
//! requests. Each fetch independently goes through the retrying executor and
//! therefore the shared rate limiter. Failures are isolated: one item's
//! failure never aborts the rest of the batch.

use std::collections::HashMap;
use std::future::Future;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::client::{ApiError, ApiResult};
use crate::shutdown::ShutdownCoordinator;

/// Fetch detail for every id with bounded concurrency.
///
/// Returns a map with exactly one entry per submitted id: a success or the
/// error that fetch surfaced. Completions arrive in any order; the map is
/// written only by the driving task, so no entry can be lost or raced.
///
/// When `shutdown` is set, the pool checks it before dispatching each fetch
/// (never mid-request). Items not yet dispatched at cancellation are skipped
/// and absent from the map; results already collected are kept.
pub async fn fetch_all<T, F, Fut>(
    ids: Vec<String>,
    worker_count: usize,
    shutdown: Option<&ShutdownCoordinator>,
    fetch: F,
) -> HashMap<String, ApiResult<T>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let total = ids.len();
    let fetch = &fetch;

    let results: HashMap<String, ApiResult<T>> = stream::iter(ids)
        .map(|id| async move {
            if shutdown.is_some_and(|s| s.is_shutdown_requested()) {
                return None;
            }
            let result = fetch(id.clone()).await;
            if let Err(e) = &result {
                warn!(item = %id, error = %e, "detail fetch failed");
            }
            Some((id, result))
        })
        .buffer_unordered(worker_count.max(1))
        .filter_map(|entry| async move { entry })
        .collect()
        .await;

    let failed = results.values().filter(|r| r.is_err()).count();
    debug!(
        submitted = total,
        collected = results.len(),
        failed,
        "detail fetch pool drained"
    );
    results
}

/// Split a pool result map into successes and failures.
pub fn partition_results<T>(
    results: HashMap<String, ApiResult<T>>,
) -> (HashMap<String, T>, HashMap<String, ApiError>) {
    let mut successes = HashMap::new();
    let mut failures = HashMap::new();
    for (id, result) in results {
        match result {
            Ok(value) => {
                successes.insert(id, value);
            }
            Err(error) => {
                failures.insert(id, error);
            }
        }
    }
    (successes, failures)
}
