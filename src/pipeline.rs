//! Content pipeline - crawl then extract
//!
//! The single entry point for callers that need page text:
//! - Fetch or serve every URL from the cache through the [`Crawler`]
//! - Run the strategy chosen at construction on every fetched page
//! - Bound each page's extraction by a timeout and isolate its failures

use crate::config::{Config, ExtractorConfig};
use crate::crawler::{build_crawler, fan_out, Crawler, PoolPolicy};
use crate::extractor::{build_extractor, ExtractError, Extraction, Extractor, ExtractorKind};
use crate::storage::{CacheStore, PageRecord};
use crate::SieveError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};

/// What a caller sees for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub url: String,
    /// Extracted text, or just the URL when nothing could be extracted
    pub content: String,
    pub error: bool,
    pub message: String,
}

impl From<&PageRecord> for PageContent {
    fn from(page: &PageRecord) -> Self {
        Self {
            url: page.url.clone(),
            content: page
                .extracted_content
                .clone()
                .unwrap_or_else(|| page.url.clone()),
            error: page.fetch_error,
            message: page.fetch_message.clone(),
        }
    }
}

/// Crawler plus one extraction strategy
pub struct ContentPipeline {
    crawler: Crawler,
    extractor: Arc<dyn Extractor>,
    pool: PoolPolicy,
    /// One permit per live extraction thread, timed-out ones included
    threads: Arc<Semaphore>,
    page_timeout: Duration,
    delimiter: String,
}

impl ContentPipeline {
    pub fn new(
        crawler: Crawler,
        extractor: Arc<dyn Extractor>,
        pool: PoolPolicy,
        settings: &ExtractorConfig,
    ) -> Self {
        Self {
            crawler,
            extractor,
            pool,
            threads: Arc::new(Semaphore::new(pool.max_workers.max(1))),
            page_timeout: Duration::from_millis(settings.page_timeout_ms),
            delimiter: settings.delimiter.clone(),
        }
    }

    /// Builds the crawler and the configured strategy over `store`
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration
    /// * `store` - The page cache
    ///
    /// # Returns
    ///
    /// * `Ok(ContentPipeline)` - Ready to process batches
    /// * `Err(SieveError)` - The HTTP client could not be built
    pub fn from_config(config: &Config, store: Arc<dyn CacheStore>) -> Result<Self, SieveError> {
        let crawler = build_crawler(config, store)?;
        Ok(Self::new(
            crawler,
            build_extractor(&config.extractor),
            PoolPolicy::from_config(&config.crawler),
            &config.extractor,
        ))
    }

    /// Same pipeline with a different strategy
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn kind(&self) -> ExtractorKind {
        self.extractor.kind()
    }

    pub fn crawler(&self) -> &Crawler {
        &self.crawler
    }

    /// Returns one record per distinct normalized URL with `extracted_content` set
    ///
    /// Never fails as a whole: fetch problems show up in `fetch_error` and
    /// `fetch_message`, extraction problems in `extraction_failed`.
    pub async fn process<S: AsRef<str>>(&self, urls: &[S]) -> HashMap<String, PageRecord> {
        let pages = self.crawler.process(urls).await;
        self.extract_pages(pages).await
    }

    /// Like [`process`](Self::process), reduced to the caller view
    pub async fn contents<S: AsRef<str>>(&self, urls: &[S]) -> HashMap<String, PageContent> {
        self.process(urls)
            .await
            .into_iter()
            .map(|(url, page)| {
                let content = PageContent::from(&page);
                (url, content)
            })
            .collect()
    }

    /// Fills `extracted_content` on every page
    ///
    /// Pages without raw content get their URL as content. The rest are
    /// extracted sequentially for small batches, else in the worker pool.
    /// A page whose extraction panics or exceeds the page timeout keeps
    /// only its URL and is flagged `extraction_failed`. At most `max-workers`
    /// extraction threads exist per pipeline, counting ones still running
    /// after their page timed out.
    pub async fn extract_pages(
        &self,
        mut pages: HashMap<String, PageRecord>,
    ) -> HashMap<String, PageRecord> {
        let mut jobs: Vec<(String, Arc<str>)> = Vec::new();

        for page in pages.values_mut() {
            if page.has_content() {
                jobs.push((page.url.clone(), Arc::from(page.raw_content.as_str())));
            } else {
                page.extracted_content = Some(page.url.clone());
                page.extraction_failed = false;
            }
        }

        if jobs.is_empty() {
            return pages;
        }

        tracing::info!(
            "Extracting {} pages with the {} strategy",
            jobs.len(),
            self.extractor.kind()
        );

        let results = if self.pool.is_sequential(jobs.len()) {
            let mut results = Vec::with_capacity(jobs.len());
            for (url, raw) in jobs {
                let extraction = extract_one(
                    Arc::clone(&self.extractor),
                    Arc::clone(&self.threads),
                    url.clone(),
                    raw,
                    self.page_timeout,
                )
                .await;
                results.push((url, extraction));
            }
            results
        } else {
            let workers = self.pool.worker_count(jobs.len());
            let extractor = Arc::clone(&self.extractor);
            let threads = Arc::clone(&self.threads);
            let timeout = self.page_timeout;

            fan_out(jobs, workers, move |(url, raw)| {
                extract_one(Arc::clone(&extractor), Arc::clone(&threads), url, raw, timeout)
            })
            .await
            .into_iter()
            .map(|((url, _), joined)| {
                let extraction = joined
                    .unwrap_or_else(|e| Err(ExtractError::Panicked(e.to_string())));
                (url, extraction)
            })
            .collect()
        };

        let mut failed = 0usize;
        for (url, result) in results {
            let Some(page) = pages.get_mut(&url) else {
                continue;
            };
            let extraction = match result {
                Ok(extraction) => extraction,
                Err(e) => {
                    tracing::warn!("Extraction failed for {}: {}", url, e);
                    Extraction::failure()
                }
            };
            if extraction.failed {
                failed += 1;
            }
            page.extraction_failed = extraction.failed;
            page.extracted_content =
                Some(compose_content(&page.url, &extraction, &self.delimiter));
        }

        if failed > 0 {
            tracing::info!("Extraction done: {} pages degraded", failed);
        }

        pages
    }
}

/// URL followed by the non-empty extraction parts, joined by `delimiter`
pub fn compose_content(url: &str, extraction: &Extraction, delimiter: &str) -> String {
    let body = extraction.joined(delimiter);
    match (url.is_empty(), body.is_empty()) {
        (_, true) => url.to_string(),
        (true, false) => body,
        (false, false) => format!("{}{}{}", url, delimiter, body),
    }
}

/// Runs one extraction on its own thread, waiting at most `timeout`
///
/// The thread holds a permit from `threads` until the strategy returns, so
/// a timed-out thread keeps its slot. Waiting for a slot counts against
/// `timeout`.
async fn extract_one(
    extractor: Arc<dyn Extractor>,
    threads: Arc<Semaphore>,
    url: String,
    raw: Arc<str>,
    timeout: Duration,
) -> Result<Extraction, ExtractError> {
    let run = async move {
        let permit = threads
            .acquire_owned()
            .await
            .map_err(|e| ExtractError::Panicked(format!("extraction slots closed: {}", e)))?;
        let (tx, rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("sieve-extract".to_string())
            .spawn(move || {
                let _permit = permit;
                let _ = tx.send(extractor.extract(&url, &raw));
            })
            .map_err(|e| {
                ExtractError::Panicked(format!("failed to spawn extraction thread: {}", e))
            })?;

        // The sender is dropped without a value only when the strategy panicked
        rx.await
            .map_err(|_| ExtractError::Panicked("extraction thread panicked".to_string()))
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(result) => result,
        Err(_) => Err(ExtractError::Timeout {
            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
