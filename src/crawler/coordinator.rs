//! Crawler coordinator - cache-first batch fetching
//!
//! This module contains the batch logic that coordinates:
//! - Normalizing and de-duplicating the requested URLs
//! - Looking the batch up in the cache and splitting fresh from stale
//! - Fetching the stale part sequentially or through the worker pool
//! - Persisting every new outcome in one batched write

use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::{fan_out, PoolPolicy};
use crate::state::{FetchOutcome, FreshnessPolicy};
use crate::storage::{CacheStore, PageRecord};
use crate::url::normalize_batch;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// Cache-first batch crawler
pub struct Crawler {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<Fetcher>,
    pool: PoolPolicy,
    freshness: FreshnessPolicy,
}

impl Crawler {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Fetcher,
        pool: PoolPolicy,
        freshness: FreshnessPolicy,
    ) -> Self {
        Self {
            store,
            fetcher: Arc::new(fetcher),
            pool,
            freshness,
        }
    }

    /// Returns one record per distinct normalized input URL
    ///
    /// 1. Normalize and de-duplicate the input
    /// 2. Batch-lookup the cache; fresh records are served as they are
    /// 3. Fetch the rest (sequentially for small batches, else in the pool)
    /// 4. Upsert every fetched record, failures included
    ///
    /// A failing URL never aborts the batch. Cache errors are logged: a
    /// failed lookup treats the whole batch as misses, a failed write only
    /// loses the persistence of this batch.
    pub async fn process<S: AsRef<str>>(&self, urls: &[S]) -> HashMap<String, PageRecord> {
        let urls = normalize_batch(urls);

        let cached = match self.store.lookup_many(&urls) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!("Cache lookup failed, fetching whole batch: {}", e);
                HashMap::new()
            }
        };

        let now = Utc::now();
        let mut result = HashMap::with_capacity(urls.len());
        let mut to_fetch = Vec::new();

        for url in urls {
            match cached.get(&url) {
                Some(page) if page.is_fresh(&self.freshness, now) => {
                    tracing::debug!("Page was crawled: {}", url);
                    result.insert(url, page.clone());
                }
                Some(page) => {
                    tracing::debug!("Cached {} is stale ({}), refetching", url, page.outcome);
                    to_fetch.push(url);
                }
                None => to_fetch.push(url),
            }
        }

        if to_fetch.is_empty() {
            tracing::debug!("All {} pages served from cache", result.len());
            return result;
        }

        tracing::info!(
            "Crawling {} pages ({} from cache)",
            to_fetch.len(),
            result.len()
        );

        let fetched = self.fetch_all(to_fetch).await;

        if let Err(e) = self.store.upsert_many(&fetched) {
            tracing::error!("Failed to persist {} fetched pages: {}", fetched.len(), e);
        }

        let failures = fetched.iter().filter(|p| p.fetch_error).count();
        tracing::info!(
            "Crawl batch done: {} fetched, {} failed",
            fetched.len() - failures,
            failures
        );

        for page in fetched {
            result.insert(page.url.clone(), page);
        }

        result
    }

    /// Fetches every URL, returning exactly one record per URL
    async fn fetch_all(&self, urls: Vec<String>) -> Vec<PageRecord> {
        if self.pool.is_sequential(urls.len()) {
            let mut pages = Vec::with_capacity(urls.len());
            for url in &urls {
                pages.push(self.fetcher.fetch(url).await);
            }
            return pages;
        }

        let workers = self.pool.worker_count(urls.len());
        tracing::debug!("Fetching {} pages with {} workers", urls.len(), workers);

        let fetcher = Arc::clone(&self.fetcher);
        fan_out(urls, workers, move |url| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch(&url).await }
        })
        .await
        .into_iter()
        .map(|(url, joined)| match joined {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Fetch worker for {} died: {}", url, e);
                PageRecord::failed(
                    url,
                    FetchOutcome::TransportFailure,
                    format!("fetch worker failed: {}", e),
                    None,
                    Utc::now(),
                )
            }
        })
        .collect()
    }
}
