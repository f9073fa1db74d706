//! JSON snapshot writer.
//!
//! Persists one crawl's aggregate output as a single JSON document:
//! `{collected_at, stats, submolts, posts, comments}`. Downstream analytics
//! consume this file directly; it is the only persisted artifact.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crawler::CrawlOutcome;
use crate::output::OutputResult;
use crate::{FlatComment, Post, Submolt};

/// Counts summarizing a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotStats {
    /// Number of posts collected from the listing
    pub post_count: usize,
    /// Number of flattened comment records
    pub comment_count: usize,
    /// Number of submolt side-listing records
    pub submolt_count: usize,
    /// Number of posts whose detail fetch failed
    pub failed_post_count: usize,
}

/// The persisted crawl artifact.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the crawl finished
    pub collected_at: DateTime<Utc>,
    /// Summary counts
    pub stats: SnapshotStats,
    /// Submolt side listing
    pub submolts: Vec<Submolt>,
    /// Posts in listing order
    pub posts: Vec<Post>,
    /// Flattened comment records, grouped by post in listing order
    pub comments: Vec<FlatComment>,
    /// Detail-fetch failures by post id, rendered as messages.
    /// Sorted map so the artifact is byte-stable for identical crawls.
    #[serde(default)]
    pub failures: BTreeMap<String, String>,
}

impl Snapshot {
    /// Assemble a snapshot from a crawl outcome, stamped with the current time.
    pub fn from_outcome(outcome: CrawlOutcome) -> Self {
        let stats = SnapshotStats {
            post_count: outcome.posts.len(),
            comment_count: outcome.comments.len(),
            submolt_count: outcome.submolts.len(),
            failed_post_count: outcome.failures.len(),
        };
        let failures = outcome
            .failures
            .into_iter()
            .map(|(id, error)| (id, error.to_string()))
            .collect();

        Self {
            collected_at: Utc::now(),
            stats,
            submolts: outcome.submolts,
            posts: outcome.posts,
            comments: outcome.comments,
            failures,
        }
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> OutputResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(
            path = %path.display(),
            posts = self.stats.post_count,
            comments = self.stats.comment_count,
            "snapshot written"
        );
        Ok(())
    }
}
