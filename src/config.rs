//! Client configuration and tuning constants.
//!
//! The API enforces three independent rate limit classes; the constants here
//! mirror its published values so the client-side sliding windows admit at
//! most what the server would accept.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Production API base URL (versioned prefix included).
pub const BASE_URL: &str = "https://www.moltbook.com/api/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// General request limit: 100 calls per rolling minute.
pub const REQUEST_LIMIT: usize = 100;
/// Window for the general request limit.
pub const REQUEST_PERIOD: Duration = Duration::from_secs(60);

/// Post creation cooldown: 1 post per 30 minutes.
pub const POST_COOLDOWN: Duration = Duration::from_secs(1800);

/// Comment limit: 50 comments per rolling hour.
pub const COMMENT_LIMIT: usize = 50;
/// Window for the comment limit.
pub const COMMENT_PERIOD: Duration = Duration::from_secs(3600);

/// Additional transient-fault retries after the first attempt (3 attempts
/// total). Bounds blocking on a dead endpoint; server-paced 429 cooldowns are
/// not counted against this budget.
pub const MAX_TRANSIENT_RETRIES: u32 = 2;

/// Cooldown applied when a 429 body carries no usable `retry_after_minutes`.
pub const DEFAULT_RETRY_AFTER_MINUTES: u64 = 1;

/// Default credentials file location, relative to `$HOME`.
const CREDENTIALS_RELATIVE_PATH: &str = ".config/moltbook/credentials.json";

/// Backoff before transient-fault retry attempt `attempt` (0-indexed):
/// `2^attempt` seconds, so 1s after the first failure and 2s after the second.
pub fn transient_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Credentials file could not be read
    #[error("failed to read credentials file: {0}")]
    CredentialsIo(#[from] std::io::Error),

    /// Credentials file is not valid JSON
    #[error("malformed credentials file: {0}")]
    CredentialsMalformed(#[from] serde_json::Error),

    /// HTTP client construction failed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct CredentialsFile {
    api_key: Option<String>,
}

/// Explicit client configuration, constructed once and passed by reference.
///
/// All session state (HTTP connection pool, auth header, rate limiter
/// windows) hangs off a client built from this struct; nothing is
/// process-global.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL including the versioned prefix
    pub base_url: String,
    /// Bearer token for authenticated operations, if any
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Configuration with credentials resolved from the environment.
    ///
    /// Checks `MOLTBOOK_API_KEY` first, then the credentials file at
    /// `~/.config/moltbook/credentials.json`. A missing key is not an error;
    /// the crawl endpoints are public and work unauthenticated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = match std::env::var("MOLTBOOK_API_KEY") {
            Ok(key) if !key.is_empty() => Some(key),
            _ => match default_credentials_path() {
                Some(path) if path.exists() => load_api_key(&path)?,
                _ => None,
            },
        };

        Ok(Self {
            api_key,
            ..Self::default()
        })
    }

    /// Override the API base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the bearer token explicitly.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Read `api_key` from a credentials JSON file.
pub fn load_api_key(path: &Path) -> Result<Option<String>, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let creds: CredentialsFile = serde_json::from_str(&contents)?;
    Ok(creds.api_key.filter(|k| !k.is_empty()))
}

fn default_credentials_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(CREDENTIALS_RELATIVE_PATH))
}
