//! Retrying request executor and API operations.
//!
//! Every operation funnels through [`MoltbookClient::execute`]: admit on the
//! request limiter, issue the HTTP call with the configured timeout, classify
//! the outcome. Write operations admit on their action-class limiter first
//! (post cooldown, comment-per-hour), then pass through the same path.

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::client::rate_limit::{RateLimiter, RateLimits};
use crate::client::{ApiError, ApiResult};
use crate::config::{
    transient_backoff, ClientConfig, ConfigError, DEFAULT_RETRY_AFTER_MINUTES,
    MAX_TRANSIENT_RETRIES,
};
use crate::{Agent, Comment, Post, Submolt};

/// Listing sort orders accepted by the feed and posts endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    /// Trending posts
    #[default]
    Hot,
    /// Newest first
    New,
    /// Highest scored
    Top,
    /// Gaining traction
    Rising,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Hot => "hot",
            SortOrder::New => "new",
            SortOrder::Top => "top",
            SortOrder::Rising => "rising",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort orders accepted by the comments endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CommentSort {
    /// Highest scored first
    #[default]
    Top,
    /// Newest first
    New,
    /// Most contested
    Controversial,
}

impl CommentSort {
    fn as_str(&self) -> &'static str {
        match self {
            CommentSort::Top => "top",
            CommentSort::New => "new",
            CommentSort::Controversial => "controversial",
        }
    }
}

/// Error envelope returned on HTTP >= 400; 429 additionally carries
/// `retry_after_minutes`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    retry_after_minutes: Option<u64>,
}

#[derive(Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct CommentsEnvelope {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
struct SubmoltsEnvelope {
    #[serde(default)]
    submolts: Vec<Submolt>,
}

/// The detail endpoint returns either `{"post": {...}}` or a bare post.
#[derive(Deserialize)]
#[serde(untagged)]
enum PostDetail {
    Wrapped { post: Post },
    Bare(Post),
}

impl PostDetail {
    fn into_post(self) -> Post {
        match self {
            PostDetail::Wrapped { post } => post,
            PostDetail::Bare(post) => post,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AgentDetail {
    Wrapped { agent: Agent },
    Bare(Agent),
}

impl AgentDetail {
    fn into_agent(self) -> Agent {
        match self {
            AgentDetail::Wrapped { agent } => agent,
            AgentDetail::Bare(agent) => agent,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommentDetail {
    Wrapped { comment: Comment },
    Bare(Comment),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubmoltDetail {
    Wrapped { submolt: Submolt },
    Bare(Submolt),
}

/// Moltbook API client.
///
/// Owns the HTTP connection pool, the bearer credential, and all three rate
/// limiter windows. Construct one per process and pass by reference; every
/// concurrent request made through the same instance shares the same
/// admission windows.
pub struct MoltbookClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    limits: RateLimits,
}

impl MoltbookClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::HttpClient`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &config.api_key {
            let mut auth = header::HeaderValue::from_str(&format!("Bearer {key}"))
                .unwrap_or_else(|_| header::HeaderValue::from_static(""));
            auth.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("moltbook-archiver/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            limits: RateLimits::standard(),
        })
    }

    /// The general request limiter shared by every call through this client.
    pub fn request_limiter(&self) -> &RateLimiter {
        &self.limits.request
    }

    /// One logical API call: rate-limit admission, request, classification.
    ///
    /// A 429 response is absorbed here: the executor sleeps for the
    /// server-specified cooldown (`retry_after_minutes`, default 1) and
    /// reissues the call without consuming the transient retry budget.
    /// Timeouts and connection failures retry up to
    /// [`MAX_TRANSIENT_RETRIES`] additional times with `2^attempt` second
    /// backoff before surfacing.
    async fn execute<T>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.limits.request.admit().await;

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut attempt: u32 = 0;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    if attempt < MAX_TRANSIENT_RETRIES {
                        let backoff = transient_backoff(attempt);
                        warn!(
                            endpoint,
                            attempt = attempt + 1,
                            backoff_secs = backoff.as_secs(),
                            "request timed out, retrying"
                        );
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ApiError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    });
                }
                Err(e) => {
                    // Refused, reset, DNS: same bounded budget as timeouts.
                    if attempt < MAX_TRANSIENT_RETRIES {
                        let backoff = transient_backoff(attempt);
                        warn!(
                            endpoint,
                            attempt = attempt + 1,
                            backoff_secs = backoff.as_secs(),
                            error = %e,
                            "connection failed, retrying"
                        );
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ApiError::ConnectionFailed(e.to_string()));
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let minutes = response
                    .json::<ErrorEnvelope>()
                    .await
                    .ok()
                    .and_then(|env| env.retry_after_minutes)
                    .unwrap_or(DEFAULT_RETRY_AFTER_MINUTES);
                warn!(endpoint, retry_after_minutes = minutes, "server rate limit, pausing");
                sleep(Duration::from_secs(minutes * 60)).await;
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                let (message, hint) = match response.json::<ErrorEnvelope>().await {
                    Ok(env) => (env.error.unwrap_or_else(|| status.to_string()), env.hint),
                    Err(_) => (status.to_string(), None),
                };
                return Err(if status.is_server_error() {
                    ApiError::Server {
                        status: status.as_u16(),
                        message,
                        hint,
                    }
                } else {
                    ApiError::Client {
                        status: status.as_u16(),
                        message,
                        hint,
                    }
                });
            }

            debug!(endpoint, attempt = attempt + 1, "request succeeded");
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::MalformedResponse(e.to_string()));
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.execute(Method::GET, endpoint, query, None).await
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> ApiResult<T> {
        self.execute(Method::POST, endpoint, &[], Some(&body)).await
    }

    // ── Posts ────────────────────────────────────────────────

    /// Fetch one page of the personalized feed.
    pub async fn get_feed(
        &self,
        sort: SortOrder,
        limit: usize,
        offset: usize,
    ) -> ApiResult<Vec<Post>> {
        let query = [
            ("sort", sort.as_str().to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        let envelope: PostsEnvelope = self.get("feed", &query).await?;
        Ok(envelope.posts)
    }

    /// Fetch one page of the post listing, optionally scoped to a submolt.
    pub async fn get_posts(
        &self,
        sort: SortOrder,
        submolt: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> ApiResult<Vec<Post>> {
        let mut query = vec![
            ("sort", sort.as_str().to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(submolt) = submolt {
            query.push(("submolt", submolt.to_string()));
        }
        let envelope: PostsEnvelope = self.get("posts", &query).await?;
        Ok(envelope.posts)
    }

    /// Fetch a single post with its full comment tree.
    pub async fn get_post(&self, post_id: &str) -> ApiResult<Post> {
        let detail: PostDetail = self.get(&format!("posts/{post_id}"), &[]).await?;
        Ok(detail.into_post())
    }

    /// Create a new post. Admits on the post-cooldown limiter first.
    pub async fn create_post(
        &self,
        submolt: &str,
        title: &str,
        content: Option<&str>,
        url: Option<&str>,
    ) -> ApiResult<Post> {
        self.limits.post.admit().await;
        let mut payload = json!({ "submolt": submolt, "title": title });
        if let Some(content) = content {
            payload["content"] = json!(content);
        }
        if let Some(url) = url {
            payload["url"] = json!(url);
        }
        let detail: PostDetail = self.post("posts", payload).await?;
        Ok(detail.into_post())
    }

    /// Delete an owned post.
    pub async fn delete_post(&self, post_id: &str) -> ApiResult<Value> {
        self.execute(Method::DELETE, &format!("posts/{post_id}"), &[], None)
            .await
    }

    // ── Comments ─────────────────────────────────────────────

    /// Fetch the comment tree for a post.
    pub async fn get_comments(&self, post_id: &str, sort: CommentSort) -> ApiResult<Vec<Comment>> {
        let query = [("sort", sort.as_str().to_string())];
        let envelope: CommentsEnvelope = self
            .get(&format!("posts/{post_id}/comments"), &query)
            .await?;
        Ok(envelope.comments)
    }

    /// Add a comment, or a reply when `parent_id` is given. Admits on the
    /// comment-per-hour limiter first.
    pub async fn comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> ApiResult<Comment> {
        self.limits.comment.admit().await;
        let mut payload = json!({ "content": content });
        if let Some(parent_id) = parent_id {
            payload["parent_id"] = json!(parent_id);
        }
        let detail: CommentDetail = self
            .post(&format!("posts/{post_id}/comments"), payload)
            .await?;
        Ok(match detail {
            CommentDetail::Wrapped { comment } => comment,
            CommentDetail::Bare(comment) => comment,
        })
    }

    // ── Voting ───────────────────────────────────────────────

    /// Upvote a post.
    pub async fn upvote(&self, post_id: &str) -> ApiResult<Value> {
        self.post(&format!("posts/{post_id}/upvote"), json!({})).await
    }

    /// Downvote a post.
    pub async fn downvote(&self, post_id: &str) -> ApiResult<Value> {
        self.post(&format!("posts/{post_id}/downvote"), json!({})).await
    }

    /// Upvote a comment.
    pub async fn upvote_comment(&self, comment_id: &str) -> ApiResult<Value> {
        self.post(&format!("comments/{comment_id}/upvote"), json!({}))
            .await
    }

    // ── Submolts ─────────────────────────────────────────────

    /// List all submolts.
    pub async fn get_submolts(&self) -> ApiResult<Vec<Submolt>> {
        let envelope: SubmoltsEnvelope = self.get("submolts", &[]).await?;
        Ok(envelope.submolts)
    }

    /// Fetch a single submolt by name.
    pub async fn get_submolt(&self, name: &str) -> ApiResult<Submolt> {
        let detail: SubmoltDetail = self.get(&format!("submolts/{name}"), &[]).await?;
        Ok(match detail {
            SubmoltDetail::Wrapped { submolt } => submolt,
            SubmoltDetail::Bare(submolt) => submolt,
        })
    }

    // ── Profile ──────────────────────────────────────────────

    /// Fetch the authenticated agent's own profile.
    pub async fn me(&self) -> ApiResult<Agent> {
        let detail: AgentDetail = self.get("agents/me", &[]).await?;
        Ok(detail.into_agent())
    }

    /// Fetch another agent's profile by name.
    pub async fn get_agent(&self, name: &str) -> ApiResult<Agent> {
        let detail: AgentDetail = self.get(&format!("agents/{name}"), &[]).await?;
        Ok(detail.into_agent())
    }
}
