//! Sliding-window rate limiting.
//!
//! Admission is counted over the trailing `period` ending now, not over
//! fixed aligned buckets, so bursts are bounded by `max_calls` in any
//! rolling window. The API enforces three independent limit classes; each
//! gets its own [`RateLimiter`] instance with a private window.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::{
    COMMENT_LIMIT, COMMENT_PERIOD, POST_COOLDOWN, REQUEST_LIMIT, REQUEST_PERIOD,
};

/// Slack added to window sleeps so a wake at the exact boundary does not
/// re-trigger the full window.
const WINDOW_SLACK: Duration = Duration::from_millis(100);

/// Sliding-window rate limiter.
///
/// `admit()` blocks until a call can proceed without putting more than
/// `max_calls` admissions into any trailing `period`, then records the
/// admission. There is no error outcome; admission always eventually
/// succeeds.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_calls` per rolling `period`.
    ///
    /// `max_calls` must be at least 1.
    pub fn new(max_calls: usize, period: Duration) -> Self {
        assert!(max_calls >= 1, "max_calls must be at least 1");
        Self {
            max_calls,
            period,
            window: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Block until a call may proceed, then record the admission.
    ///
    /// The window lock is held across the sleep: concurrent admitters
    /// serialize, so the window can never overfill.
    pub async fn admit(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|&oldest| now.duration_since(oldest) >= self.period)
            {
                window.pop_front();
            }
            if window.len() < self.max_calls {
                break;
            }
            // Window is full here, so front() is present.
            let Some(&oldest) = window.front() else {
                break;
            };
            let wait = self
                .period
                .saturating_sub(now.duration_since(oldest))
                .saturating_add(WINDOW_SLACK);
            debug!(wait_ms = wait.as_millis() as u64, "rate limit window full, waiting");
            sleep(wait).await;
        }
        window.push_back(Instant::now());
    }

    /// Number of admissions currently inside the trailing window.
    pub async fn admitted_in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        while window
            .front()
            .is_some_and(|&oldest| now.duration_since(oldest) >= self.period)
        {
            window.pop_front();
        }
        window.len()
    }
}

/// The three independent limiter classes the API enforces.
///
/// Instances never share a window: exhausting the comment budget has no
/// effect on general request admission.
#[derive(Debug)]
pub struct RateLimits {
    /// General request limit (applies to every API call)
    pub request: RateLimiter,
    /// Post creation cooldown (exactly one create per interval)
    pub post: RateLimiter,
    /// Comment creation limit per hour
    pub comment: RateLimiter,
}

impl RateLimits {
    /// Limiters matching the API's published limits.
    pub fn standard() -> Self {
        Self {
            request: RateLimiter::new(REQUEST_LIMIT, REQUEST_PERIOD),
            post: RateLimiter::new(1, POST_COOLDOWN),
            comment: RateLimiter::new(COMMENT_LIMIT, COMMENT_PERIOD),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::standard()
    }
}
