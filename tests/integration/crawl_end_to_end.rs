//! End-to-end crawl against a mock API
//!
//! Drives the full pipeline (submolt listing, paginated post walk, bounded
//! detail fetches, flattening, snapshot write) against a mock server and
//! checks the aggregate.

use moltbook_archiver::client::MoltbookClient;
use moltbook_archiver::config::ClientConfig;
use moltbook_archiver::crawler::CrawlExecutor;
use moltbook_archiver::output::Snapshot;
use moltbook_archiver::shutdown::ShutdownCoordinator;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MoltbookClient {
    let config = ClientConfig::default().with_base_url(server.uri());
    MoltbookClient::new(&config).expect("client builds")
}

async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/submolts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "submolts": [
                {"id": "s1", "name": "general", "display_name": "General", "subscribers": 42}
            ]
        })))
        .mount(server)
        .await;

    // Page one is full (page_size 2), page two is short: the walk stops there.
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [
                {"id": "p1", "title": "first", "comment_count": 3},
                {"id": "p2", "title": "second", "comment_count": 0}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [
                {"id": "p3", "title": "third", "comment_count": 1}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_collects_posts_comments_and_submolts() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/posts/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": {
                "id": "p1",
                "title": "first",
                "comment_count": 3,
                "comments": [
                    {
                        "id": "c1",
                        "content": "root",
                        "author": {"name": "agent-a"},
                        "replies": [
                            {"id": "c2", "content": "reply", "replies": []}
                        ]
                    },
                    {"id": "c3", "content": "another root"}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": {
                "id": "p3",
                "title": "third",
                "comment_count": 1,
                "comments": [{"id": "c9", "content": "lone"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = CrawlExecutor::new()
        .with_page_size(2)
        .with_worker_count(4)
        .crawl(&client)
        .await
        .expect("crawl succeeds");

    assert_eq!(outcome.posts.len(), 3);
    assert_eq!(outcome.submolts.len(), 1);
    assert!(outcome.is_complete());

    // p2 has no comments and must not have been detail-fetched (no mock for
    // it exists, so a stray fetch would have failed the crawl's accounting).
    let ids: Vec<&str> = outcome.comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c9"]);
    assert_eq!(outcome.comments[1].parent_id.as_deref(), Some("c1"));
    assert_eq!(outcome.comments[1].post_id, "p1");
    assert_eq!(outcome.comments[0].author.as_deref(), Some("agent-a"));
}

#[tokio::test]
async fn test_detail_failure_is_recorded_not_fatal() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/posts/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": {
                "id": "p1",
                "title": "first",
                "comment_count": 3,
                "comments": [{"id": "c1", "content": "root"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/p3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "post not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = CrawlExecutor::new()
        .with_page_size(2)
        .crawl(&client)
        .await
        .expect("crawl still succeeds");

    assert_eq!(outcome.posts.len(), 3);
    assert!(!outcome.is_complete());
    assert!(outcome.failures.contains_key("p3"));
    // p1's comments survive p3's failure.
    assert_eq!(outcome.comments.len(), 1);
}

#[tokio::test]
async fn test_submolt_listing_failure_is_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submolts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "internal error"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = CrawlExecutor::new().crawl(&client).await.expect("crawl succeeds");

    assert!(outcome.submolts.is_empty());
    assert!(outcome.posts.is_empty());
}

#[tokio::test]
async fn test_pre_requested_shutdown_skips_detail_fetches() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    // No detail mocks mounted: with shutdown already requested, none may be
    // dispatched.
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let client = client_for(&server);
    let outcome = CrawlExecutor::new()
        .with_page_size(2)
        .with_shutdown(shutdown)
        .crawl(&client)
        .await
        .expect("crawl completes with what it has");

    assert_eq!(outcome.posts.len(), 3);
    assert!(outcome.comments.is_empty());
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_snapshot_round_trips_through_disk() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    Mock::given(method("GET"))
        .and(path("/posts/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": {
                "id": "p1",
                "title": "first",
                "comment_count": 3,
                "comments": [{"id": "c1", "content": "root"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/p3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "post not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = CrawlExecutor::new()
        .with_page_size(2)
        .crawl(&client)
        .await
        .expect("crawl succeeds");

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("snapshot.json");
    let snapshot = Snapshot::from_outcome(outcome);
    snapshot.write(&path).expect("snapshot writes");

    let contents = std::fs::read_to_string(&path).expect("snapshot readable");
    let restored: Snapshot = serde_json::from_str(&contents).expect("snapshot decodes");
    assert_eq!(restored.stats.post_count, 3);
    assert_eq!(restored.stats.comment_count, 1);
    assert_eq!(restored.stats.failed_post_count, 1);
    assert_eq!(
        restored.failures.get("p3").map(String::as_str),
        Some("client error [404]: post not found")
    );
}
