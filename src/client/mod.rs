//! Moltbook API client.
//!
//! Two layers: [`rate_limit`] provides client-side sliding-window admission
//! control, and [`http`] wraps every outbound request with timeout handling,
//! server-cooldown pacing, and bounded transient-fault retries.
//!
//! # Error Handling
//!
//! Each request resolves to exactly one [`ApiError`] variant or a decoded
//! body. A server 429 is never surfaced: the executor absorbs it by sleeping
//! for the server-specified cooldown and reissuing the call. Timeouts and
//! connection failures are retried a bounded number of times before
//! surfacing; 4xx/5xx responses and undecodable 200 bodies surface
//! immediately.

pub mod http;
pub mod rate_limit;

pub use http::{CommentSort, MoltbookClient, SortOrder};
pub use rate_limit::{RateLimiter, RateLimits};

/// API request failures, classified per outcome.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request exceeded the configured timeout on every attempt
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// The configured per-request timeout that was exceeded
        timeout_secs: u64,
    },

    /// Connection could not be established (refused, reset, DNS)
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// 4xx response other than 429; carries the API error envelope
    #[error("client error [{status}]: {message}")]
    Client {
        /// HTTP status code
        status: u16,
        /// `error` field from the response body, or the status line
        message: String,
        /// Optional `hint` field from the response body
        hint: Option<String>,
    },

    /// 5xx response; carries the API error envelope
    #[error("server error [{status}]: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// `error` field from the response body, or the status line
        message: String,
        /// Optional `hint` field from the response body
        hint: Option<String>,
    },

    /// 200 response whose body could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Whether this error is a transient infrastructure fault (the bounded
    /// retry budget applied and was exhausted).
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::ConnectionFailed(_))
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
