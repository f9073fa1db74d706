//! Unit tests for sliding-window rate limiting

use std::sync::Arc;
use std::time::Duration;

use moltbook_archiver::client::{RateLimiter, RateLimits};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_window_never_overfills() {
    let limiter = RateLimiter::new(5, Duration::from_secs(10));

    for _ in 0..20 {
        limiter.admit().await;
        assert!(limiter.admitted_in_window().await <= 5);
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_then_steady_state() {
    let limiter = RateLimiter::new(3, Duration::from_secs(30));

    // First three admit instantly.
    let start = Instant::now();
    for _ in 0..3 {
        limiter.admit().await;
    }
    assert!(start.elapsed() < Duration::from_secs(1));

    // The next one has to wait out the oldest admission.
    limiter.admit().await;
    assert!(start.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_admitters_respect_window() {
    let limiter = Arc::new(RateLimiter::new(4, Duration::from_secs(10)));

    let mut handles = Vec::new();
    for _ in 0..12 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.admit().await;
            limiter.admitted_in_window().await
        }));
    }

    let start = Instant::now();
    for handle in handles {
        let in_window = handle.await.unwrap();
        assert!(in_window <= 4);
    }
    // 12 admissions through a 4-per-10s window needs two extra windows.
    assert!(start.elapsed() >= Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_limit_classes_are_independent() {
    let limits = RateLimits::standard();

    // Exhaust the post cooldown; general requests must be unaffected.
    limits.post.admit().await;
    let start = Instant::now();
    limits.request.admit().await;
    limits.comment.admit().await;
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(limits.post.admitted_in_window().await, 1);
    assert_eq!(limits.request.admitted_in_window().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_window_drains_over_time() {
    let limiter = RateLimiter::new(2, Duration::from_secs(10));
    limiter.admit().await;
    tokio::time::sleep(Duration::from_secs(6)).await;
    limiter.admit().await;
    assert_eq!(limiter.admitted_in_window().await, 2);

    // The first admission expires 10s after it happened.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(limiter.admitted_in_window().await, 1);
}
