//! Content pipeline end-to-end: crawl, extract, isolate failures

use crate::{article_html, create_test_config, memory_store, mount_page};
use page_sieve::extractor::build_extractor_kind;
use page_sieve::{ContentPipeline, Extraction, Extractor, ExtractorKind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::MockServer;

/// Test strategy that panics or stalls on marked pages
struct Misbehaving;

impl Extractor for Misbehaving {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Boilerplate
    }

    fn extract(&self, _url: &str, raw_content: &str) -> Extraction {
        if raw_content.contains("explode") {
            panic!("malformed markup");
        }
        if raw_content.contains("stall") {
            std::thread::sleep(Duration::from_secs(2));
        }
        Extraction {
            title: raw_content.trim().to_string(),
            ..Extraction::default()
        }
    }
}

#[tokio::test]
async fn test_mixed_batch_with_boilerplate_strategy() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &article_html("Harbour News"), 1).await;

    let mut config = create_test_config(2_000);
    config.extractor.strategy = ExtractorKind::Boilerplate;
    let pipeline = ContentPipeline::from_config(&config, memory_store()).unwrap();
    let good = format!("{}/", server.uri());

    let result = pipeline
        .process(&[good.as_str(), "", "http://bad.invalid"])
        .await;

    assert_eq!(result.len(), 3);

    let page = &result[&good];
    assert!(!page.fetch_error);
    let content = page.extracted_content.as_deref().unwrap();
    assert!(content.starts_with(&format!("{}, Harbour News", good)));
    assert!(content.contains("About Harbour News"));
    assert!(content.contains("sea wall"));
    assert!(!content.contains("Archive"));
    assert!(!content.contains("all rights reserved"));

    let empty = &result[""];
    assert!(empty.fetch_error);
    assert_eq!(empty.fetch_message, "url is empty");
    assert_eq!(empty.extracted_content.as_deref(), Some(""));

    let bad = &result["http://bad.invalid"];
    assert!(bad.fetch_error);
    assert_eq!(bad.extracted_content.as_deref(), Some("http://bad.invalid"));
}

#[tokio::test]
async fn test_every_strategy_prefixes_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/story", &article_html("Harbour News"), 1).await;

    let config = create_test_config(2_000);
    let store = memory_store();
    let url = format!("{}/story", server.uri());

    for kind in ExtractorKind::all() {
        let pipeline = ContentPipeline::from_config(&config, Arc::clone(&store))
            .unwrap()
            .with_extractor(build_extractor_kind(kind, &config.extractor));
        assert_eq!(pipeline.kind(), kind);

        let result = pipeline.process(&[url.as_str()]).await;
        let content = result[&url].extracted_content.clone().unwrap();

        assert!(
            content.starts_with(&format!("{}, ", url)),
            "{} strategy gave {:?}",
            kind,
            content
        );
        assert!(content.contains("Harbour"), "{} strategy lost the title", kind);
        assert!(!result[&url].extraction_failed);
    }
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    let server = MockServer::start().await;
    mount_page(&server, "/story", &article_html("Harbour News"), 1).await;

    let pipeline = ContentPipeline::from_config(&create_test_config(2_000), memory_store()).unwrap();
    let url = format!("{}/story", server.uri());

    let first = pipeline.process(&[url.as_str()]).await;
    let second = pipeline.process(&[url.as_str()]).await;

    assert_eq!(pipeline.kind(), ExtractorKind::Hybrid);
    assert_eq!(first[&url].extracted_content, second[&url].extracted_content);
}

#[tokio::test]
async fn test_failing_extraction_is_isolated() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "Alpha", 1).await;
    mount_page(&server, "/b", "explode", 1).await;
    mount_page(&server, "/c", "Gamma", 1).await;
    mount_page(&server, "/d", "Delta", 1).await;

    let pipeline = ContentPipeline::from_config(&create_test_config(2_000), memory_store())
        .unwrap()
        .with_extractor(Arc::new(Misbehaving));
    let urls: Vec<String> = ["/a", "/b", "/c", "/d"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();

    let result = pipeline.process(&urls).await;

    assert_eq!(result.len(), 4);
    for (url, title) in [(&urls[0], "Alpha"), (&urls[2], "Gamma"), (&urls[3], "Delta")] {
        assert_eq!(
            result[url].extracted_content.as_deref(),
            Some(format!("{}, {}", url, title).as_str())
        );
        assert!(!result[url].extraction_failed);
    }

    let broken = &result[&urls[1]];
    assert!(broken.extraction_failed);
    assert!(!broken.fetch_error);
    assert_eq!(broken.extracted_content.as_deref(), Some(urls[1].as_str()));
}

#[tokio::test]
async fn test_stalled_extraction_is_bounded() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "Alpha", 1).await;
    mount_page(&server, "/b", "stall", 1).await;
    mount_page(&server, "/c", "Gamma", 1).await;

    let mut config = create_test_config(2_000);
    config.extractor.page_timeout_ms = 100;
    let pipeline = ContentPipeline::from_config(&config, memory_store())
        .unwrap()
        .with_extractor(Arc::new(Misbehaving));
    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();

    let started = Instant::now();
    let result = pipeline.process(&urls).await;

    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert!(result[&urls[1]].extraction_failed);
    assert_eq!(result[&urls[1]].extracted_content.as_deref(), Some(urls[1].as_str()));
    assert!(!result[&urls[0]].extraction_failed);
    assert!(!result[&urls[2]].extraction_failed);
}

#[tokio::test]
async fn test_metadata_timeout_degrades_to_url() {
    let server = MockServer::start().await;
    let huge = format!(
        "<html><head><title>Huge</title></head><body>{}</body></html>",
        "<div><p>word word word word</p></div>".repeat(40_000)
    );
    mount_page(&server, "/huge", &huge, 1).await;

    let mut config = create_test_config(5_000);
    config.extractor.strategy = ExtractorKind::Metadata;
    config.extractor.metadata_timeout_ms = 1;
    let pipeline = ContentPipeline::from_config(&config, memory_store()).unwrap();
    let url = format!("{}/huge", server.uri());

    let started = Instant::now();
    let result = pipeline.process(&[url.as_str()]).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    let page = &result[&url];
    assert!(!page.fetch_error);
    assert!(page.extraction_failed);
    assert_eq!(page.extracted_content.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn test_contents_caller_view() {
    let server = MockServer::start().await;
    mount_page(&server, "/story", &article_html("Harbour News"), 1).await;

    let pipeline = ContentPipeline::from_config(&create_test_config(2_000), memory_store()).unwrap();
    let url = format!("{}/story", server.uri());

    let contents = pipeline.contents(&[url.as_str(), ""]).await;

    assert_eq!(contents.len(), 2);
    assert!(!contents[&url].error);
    assert!(contents[&url].content.starts_with(&url));
    assert!(contents[""].error);
    assert_eq!(contents[""].message, "url is empty");
}
