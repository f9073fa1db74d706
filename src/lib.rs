//! # Moltbook Archiver Library
//!
//! A resilient crawler for the Moltbook discussion API. Walks the paginated
//! post listing to exhaustion, fetches per-post comment trees with bounded
//! concurrency, and flattens the nested reply structures into parent-linked
//! records suitable for downstream analysis.
//!
//! ## Features
//!
//! - **Sliding-Window Rate Limiting**: Client-side admission control matching
//!   the API's published limits (requests, post cooldown, comments per hour)
//! - **Retry with Classification**: Server rate limits are paced, transient
//!   network faults are bounded-retried, client errors fail fast
//! - **Bounded Concurrency**: Per-post detail fetches run through a fixed-size
//!   pool with isolated per-item failure
//! - **Graceful Cancellation**: A crawl can be aborted between requests,
//!   keeping everything collected so far
//!
//! ## Quick Start
//!
//! ```no_run
//! use moltbook_archiver::client::MoltbookClient;
//! use moltbook_archiver::config::ClientConfig;
//! use moltbook_archiver::crawler::CrawlExecutor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MoltbookClient::new(&ClientConfig::default())?;
//! let outcome = CrawlExecutor::new().with_worker_count(20).crawl(&client).await?;
//! println!("{} posts, {} comments", outcome.posts.len(), outcome.comments.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - API client: rate limiting, retrying request executor
//! - [`crawler`] - Crawl orchestration: pagination, fetch pool, flattening
//! - [`output`] - Snapshot artifact writer
//! - [`config`] - Client configuration and tuning constants
//! - [`shutdown`] - Cancellation coordination

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// API client: rate limiting and the retrying request executor
pub mod client;

/// Client configuration and tuning constants
pub mod config;

/// Crawl orchestration: pagination, concurrent fetch pool, tree flattening
pub mod crawler;

/// Snapshot artifact output
pub mod output;

/// Graceful cancellation coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use client::MoltbookClient;
pub use crawler::CrawlExecutor;

/// An agent profile as returned by the API.
///
/// Every field defaults when absent: the API omits fields freely depending on
/// the endpoint, and a listing-embedded author carries less than a full
/// profile fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    /// Agent identifier
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Profile description
    #[serde(default)]
    pub description: String,
    /// Accumulated karma
    #[serde(default)]
    pub karma: i64,
    /// Number of followers
    #[serde(default)]
    pub follower_count: u64,
    /// Number of agents this agent follows
    #[serde(default)]
    pub following_count: u64,
    /// Whether the authenticated agent follows this one
    #[serde(default)]
    pub you_follow: bool,
}

/// A submolt (topic community) record from the side listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Submolt {
    /// Submolt identifier
    #[serde(default)]
    pub id: String,
    /// URL-safe name
    #[serde(default)]
    pub name: String,
    /// Human-readable name
    #[serde(default)]
    pub display_name: String,
    /// Description text
    #[serde(default)]
    pub description: String,
    /// Subscriber count
    #[serde(default)]
    pub subscribers: u64,
}

/// A comment node. `replies` nests to arbitrary depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    /// Comment identifier
    #[serde(default)]
    pub id: String,
    /// Comment body
    #[serde(default)]
    pub content: String,
    /// Parent comment id as reported by the API (absent for top-level)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Upvote count
    #[serde(default)]
    pub upvotes: i64,
    /// Downvote count
    #[serde(default)]
    pub downvotes: i64,
    /// Creation timestamp (API-formatted string)
    #[serde(default)]
    pub created_at: String,
    /// Comment author
    #[serde(default)]
    pub author: Option<Agent>,
    /// Nested replies, in API order
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// A post, optionally carrying its full comment tree.
///
/// Listing endpoints return posts without `comments`; the detail endpoint
/// populates the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Post identifier
    #[serde(default)]
    pub id: String,
    /// Post title
    #[serde(default)]
    pub title: String,
    /// Post body text
    #[serde(default)]
    pub content: String,
    /// Optional link URL
    #[serde(default)]
    pub url: Option<String>,
    /// Upvote count
    #[serde(default)]
    pub upvotes: i64,
    /// Downvote count
    #[serde(default)]
    pub downvotes: i64,
    /// Total comment count, including nested replies
    #[serde(default)]
    pub comment_count: u64,
    /// Creation timestamp (API-formatted string)
    #[serde(default)]
    pub created_at: String,
    /// Post author
    #[serde(default)]
    pub author: Option<Agent>,
    /// Owning submolt
    #[serde(default)]
    pub submolt: Option<Submolt>,
    /// Comment tree (detail endpoint only)
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Net score: upvotes minus downvotes.
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    /// Canonical web link for this post.
    pub fn link(&self) -> String {
        format!("https://www.moltbook.com/post/{}", self.id)
    }

    /// Whether a detail fetch would yield any comments.
    pub fn has_comments(&self) -> bool {
        self.comment_count > 0
    }
}

/// A flattened comment record: one per node of a post's reply tree.
///
/// `parent_id` is the structural parent observed during traversal, not the
/// API-reported field, so replaying records in sequence always rebuilds the
/// tree. `None` marks a top-level comment whose parent is the post itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatComment {
    /// Comment identifier
    pub id: String,
    /// Owning post identifier
    pub post_id: String,
    /// Owning post title, carried for downstream analysis
    pub post_title: String,
    /// Structural parent comment id (`None` for top-level comments)
    pub parent_id: Option<String>,
    /// Author name, if present
    pub author: Option<String>,
    /// Comment body
    pub content: String,
    /// Upvote count
    pub upvotes: i64,
    /// Downvote count
    pub downvotes: i64,
    /// Creation timestamp
    pub created_at: String,
}
