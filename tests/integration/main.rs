//! Integration tests for Page-Sieve
//!
//! These tests use wiremock to create mock HTTP servers and run the
//! crawler and the content pipeline end-to-end against them.

mod crawl_tests;
mod pipeline_tests;

use page_sieve::config::{parse_config, Config};
use page_sieve::storage::{CacheStore, SqliteStorage};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a short request timeout
pub fn create_test_config(request_timeout_ms: u64) -> Config {
    parse_config(&format!(
        r#"
[crawler]
request-timeout-ms = {}
sequential-threshold = 2
max-workers = 8

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[storage]
database-path = ":memory:"
"#,
        request_timeout_ms
    ))
    .expect("test config is valid")
}

/// Creates an empty in-memory cache
pub fn memory_store() -> Arc<dyn CacheStore> {
    Arc::new(SqliteStorage::new_in_memory().expect("in-memory database opens"))
}

/// Serves `body` as HTML at `route`, expecting exactly `calls` requests
pub async fn mount_page(server: &MockServer, route: &str, body: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(calls)
        .mount(server)
        .await;
}

/// Answers `route` with `status`, expecting exactly `calls` requests
pub async fn mount_status(server: &MockServer, route: &str, status: u16, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .expect(calls)
        .mount(server)
        .await;
}

/// Serves `body` at `route` only after `delay`, expecting exactly `calls` requests
pub async fn mount_delayed(
    server: &MockServer,
    route: &str,
    body: &str,
    delay: Duration,
    calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .expect(calls)
        .mount(server)
        .await;
}

/// A small article page
pub fn article_html(title: &str) -> String {
    format!(
        r#"<html><head>
        <title>{title}</title>
        <meta name="description" content="About {title}">
        <meta name="keywords" content="news, harbour">
        </head><body>
        <nav><a href="/">Home</a> <a href="/archive">Archive</a></nav>
        <article>
          <p>The harbour reopened on Monday after three weeks of repairs to the sea wall.</p>
          <p>Fishing boats returned to their moorings within hours of the announcement.</p>
          <p>Officials said the remaining work on the slipway will finish next month.</p>
        </article>
        <footer>Coast Daily, all rights reserved</footer>
        </body></html>"#
    )
}
