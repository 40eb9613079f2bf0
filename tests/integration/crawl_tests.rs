//! Cache-first crawling against a mock server

use crate::{create_test_config, memory_store, mount_delayed, mount_page, mount_status};
use chrono::{Duration, Utc};
use page_sieve::crawler::{build_crawler, EMPTY_URL_MESSAGE, NOT_FOUND_MESSAGE};
use page_sieve::state::FetchOutcome;
use page_sieve::storage::{CacheStore, PageRecord, SqliteStorage};
use std::sync::Arc;
use std::time::Instant;
use wiremock::MockServer;

#[tokio::test]
async fn test_cached_page_is_not_fetched_again() {
    let server = MockServer::start().await;
    mount_page(&server, "/page", "<html><body>hello</body></html>", 1).await;

    let crawler = build_crawler(&create_test_config(2_000), memory_store()).unwrap();
    let url = format!("{}/page", server.uri());

    let first = crawler.process(&[url.as_str()]).await;
    let second = crawler.process(&[url.as_str()]).await;

    assert_eq!(first.len(), 1);
    let page = &second[&url];
    assert!(!page.fetch_error);
    assert_eq!(page.outcome, FetchOutcome::Fetched);
    assert_eq!(page.status_code, Some(200));
    assert!(page.raw_content.contains("hello"));
    assert_eq!(first[&url].raw_content, page.raw_content);
    // The mock verifies on drop that only one request was made
}

#[tokio::test]
async fn test_non_2xx_is_cached_as_failure() {
    let server = MockServer::start().await;
    mount_status(&server, "/missing", 404, 1).await;

    let store = memory_store();
    let crawler = build_crawler(&create_test_config(2_000), Arc::clone(&store)).unwrap();
    let url = format!("{}/missing", server.uri());

    for _ in 0..2 {
        let result = crawler.process(&[url.as_str()]).await;
        let page = &result[&url];
        assert!(page.fetch_error);
        assert_eq!(page.fetch_message, NOT_FOUND_MESSAGE);
        assert_eq!(page.outcome, FetchOutcome::HttpStatusFailure);
        assert_eq!(page.status_code, Some(404));
        assert!(page.raw_content.is_empty());
    }

    let stored = store.get(&url).unwrap().unwrap();
    assert_eq!(stored.outcome, FetchOutcome::HttpStatusFailure);
}

#[tokio::test]
async fn test_server_error_is_failure() {
    let server = MockServer::start().await;
    mount_status(&server, "/broken", 503, 1).await;

    let crawler = build_crawler(&create_test_config(2_000), memory_store()).unwrap();
    let url = format!("{}/broken", server.uri());

    let result = crawler.process(&[url.as_str()]).await;
    assert!(result[&url].fetch_error);
    assert_eq!(result[&url].status_code, Some(503));
}

#[tokio::test]
async fn test_slow_server_is_a_cached_transport_failure() {
    let server = MockServer::start().await;
    mount_delayed(
        &server,
        "/slow",
        "<p>too late</p>",
        std::time::Duration::from_secs(5),
        1,
    )
    .await;

    let store = memory_store();
    let crawler = build_crawler(&create_test_config(300), Arc::clone(&store)).unwrap();
    let url = format!("{}/slow", server.uri());

    let started = Instant::now();
    let result = crawler.process(&[url.as_str()]).await;

    assert!(started.elapsed() < std::time::Duration::from_secs(2));
    let page = &result[&url];
    assert!(page.fetch_error);
    assert_eq!(page.outcome, FetchOutcome::TransportFailure);
    let message = page.fetch_message.to_lowercase();
    assert!(
        message.contains("timeout") || message.contains("timed out"),
        "unexpected message {:?}",
        page.fetch_message
    );
    assert!(page.raw_content.is_empty());

    let stored = store.get(&url).unwrap().unwrap();
    assert_eq!(stored.outcome, FetchOutcome::TransportFailure);

    // Served from cache: the mock still sees a single request
    let again = crawler.process(&[url.as_str()]).await;
    assert!(again[&url].fetch_error);
}

#[tokio::test]
async fn test_expired_failure_is_refetched() {
    let server = MockServer::start().await;
    mount_page(&server, "/flaky", "<p>back online</p>", 1).await;

    let store = memory_store();
    let url = format!("{}/flaky", server.uri());
    store
        .upsert(&PageRecord::failed(
            url.as_str(),
            FetchOutcome::TransportFailure,
            "Connection failed",
            None,
            Utc::now() - Duration::hours(48),
        ))
        .unwrap();

    let crawler = build_crawler(&create_test_config(2_000), Arc::clone(&store)).unwrap();
    let result = crawler.process(&[url.as_str()]).await;

    let page = &result[&url];
    assert!(!page.fetch_error);
    assert!(page.raw_content.contains("back online"));
    assert_eq!(store.get(&url).unwrap().unwrap().outcome, FetchOutcome::Fetched);
}

#[tokio::test]
async fn test_recent_failure_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_page(&server, "/flaky", "<p>back online</p>", 0).await;

    let store = memory_store();
    let url = format!("{}/flaky", server.uri());
    store
        .upsert(&PageRecord::failed(
            url.as_str(),
            FetchOutcome::TransportFailure,
            "Connection failed",
            None,
            Utc::now() - Duration::hours(1),
        ))
        .unwrap();

    let crawler = build_crawler(&create_test_config(2_000), store).unwrap();
    let result = crawler.process(&[url.as_str()]).await;

    assert!(result[&url].fetch_error);
    assert_eq!(result[&url].fetch_message, "Connection failed");
}

#[tokio::test]
async fn test_mixed_batch_outcomes() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><head><title>Ok</title></head></html>", 1).await;

    let crawler = build_crawler(&create_test_config(2_000), memory_store()).unwrap();
    let good = format!("{}/", server.uri());

    let result = crawler
        .process(&[good.as_str(), "", "http://bad.invalid"])
        .await;

    assert_eq!(result.len(), 3);

    assert!(!result[&good].fetch_error);

    let empty = &result[""];
    assert!(empty.fetch_error);
    assert_eq!(empty.fetch_message, EMPTY_URL_MESSAGE);
    assert_eq!(empty.outcome, FetchOutcome::EmptyUrl);

    let bad = &result["http://bad.invalid"];
    assert!(bad.fetch_error);
    assert_eq!(bad.outcome, FetchOutcome::TransportFailure);
    assert!(!bad.fetch_message.is_empty());
}

#[tokio::test]
async fn test_duplicates_collapse_after_normalization() {
    let server = MockServer::start().await;
    mount_page(&server, "/dup", "<p>once</p>", 1).await;

    let crawler = build_crawler(&create_test_config(2_000), memory_store()).unwrap();
    let url = format!("{}/dup", server.uri());
    let host_only = url.trim_start_matches("http://").to_uppercase();
    let padded = format!("  {}  ", url);

    let result = crawler
        .process(&[url.clone(), host_only, padded])
        .await;

    assert_eq!(result.len(), 1);
    assert!(result.contains_key(&url));
}

#[tokio::test]
async fn test_large_batch_fetches_every_page_once() {
    let server = MockServer::start().await;
    let mut urls = Vec::new();
    for i in 0..12 {
        let route = format!("/p{}", i);
        mount_page(&server, &route, &format!("<p>page {}</p>", i), 1).await;
        urls.push(format!("{}{}", server.uri(), route));
    }

    let store = memory_store();
    let crawler = build_crawler(&create_test_config(2_000), Arc::clone(&store)).unwrap();

    let result = crawler.process(&urls).await;

    assert_eq!(result.len(), 12);
    for (i, url) in urls.iter().enumerate() {
        assert!(result[url].raw_content.contains(&format!("page {}", i)));
    }
    assert_eq!(store.count_total().unwrap(), 12);

    // Whole batch served from cache the second time
    let again = crawler.process(&urls).await;
    assert_eq!(again.len(), 12);
}

#[tokio::test]
async fn test_cache_survives_reopen() {
    let server = MockServer::start().await;
    mount_page(&server, "/kept", "<p>persisted</p>", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pages.db");
    let url = format!("{}/kept", server.uri());
    let config = create_test_config(2_000);

    {
        let store: Arc<dyn CacheStore> = Arc::new(SqliteStorage::new(&db_path).unwrap());
        let crawler = build_crawler(&config, store).unwrap();
        crawler.process(&[url.as_str()]).await;
    }

    let store: Arc<dyn CacheStore> = Arc::new(SqliteStorage::new(&db_path).unwrap());
    let crawler = build_crawler(&config, store).unwrap();
    let result = crawler.process(&[url.as_str()]).await;

    assert!(result[&url].raw_content.contains("persisted"));
}
