//! Unit tests for listing pagination

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use moltbook_archiver::client::ApiError;
use moltbook_archiver::crawler::{paginate_posts, CrawlError};
use moltbook_archiver::Post;

fn make_posts(offset: usize, count: usize) -> Vec<Post> {
    (0..count)
        .map(|i| Post {
            id: format!("post-{}", offset + i),
            ..Post::default()
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_collects_entire_listing_in_order() {
    let posts = paginate_posts(100, |offset| async move {
        Ok(make_posts(offset, (1000usize.saturating_sub(offset)).min(100)))
    })
    .await
    .unwrap();

    assert_eq!(posts.len(), 1000);
    for (i, post) in posts.iter().enumerate() {
        assert_eq!(post.id, format!("post-{i}"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_short_page_stops_without_another_fetch() {
    // 250 items at page size 100: exactly three fetches, no trailing probe.
    let calls = AtomicUsize::new(0);
    let posts = paginate_posts(100, |offset| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(make_posts(offset, (250usize.saturating_sub(offset)).min(100))) }
    })
    .await
    .unwrap();

    assert_eq!(posts.len(), 250);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exact_multiple_needs_empty_probe() {
    // 200 items at page size 100: two full pages, then the empty probe.
    let calls = AtomicUsize::new(0);
    let posts = paginate_posts(100, |offset| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(make_posts(offset, (200usize.saturating_sub(offset)).min(100))) }
    })
    .await
    .unwrap();

    assert_eq!(posts.len(), 200);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_requested_offsets_are_sequential() {
    let offsets = Mutex::new(Vec::new());
    let posts = paginate_posts(25, |offset| {
        offsets.lock().unwrap().push(offset);
        async move { Ok(make_posts(offset, (60usize.saturating_sub(offset)).min(25))) }
    })
    .await
    .unwrap();

    assert_eq!(posts.len(), 60);
    assert_eq!(*offsets.lock().unwrap(), vec![0, 25, 50]);
}

#[tokio::test(start_paused = true)]
async fn test_midway_failure_surfaces_as_listing_error() {
    let result = paginate_posts(100, |offset| async move {
        if offset < 200 {
            Ok(make_posts(offset, 100))
        } else {
            Err(ApiError::Server {
                status: 502,
                message: "bad gateway".to_string(),
                hint: None,
            })
        }
    })
    .await;

    match result {
        Err(CrawlError::Listing(ApiError::Server { status, .. })) => assert_eq!(status, 502),
        other => panic!("expected listing error, got {other:?}"),
    }
}
