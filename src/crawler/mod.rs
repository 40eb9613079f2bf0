//! Crawler module for cache-first page fetching
//!
//! This module contains the acquisition side of the pipeline, including:
//! - HTTP fetching with a bounded timeout and outcome classification
//! - A bounded worker pool shared with extraction
//! - Batch coordination against the page cache

mod coordinator;
mod fetcher;
mod pool;

pub use coordinator::Crawler;
pub use fetcher::{
    build_http_client, user_agent_string, Fetcher, EMPTY_URL_MESSAGE, NOT_FOUND_MESSAGE,
};
pub use pool::{fan_out, PoolPolicy};

use crate::config::Config;
use crate::state::FreshnessPolicy;
use crate::storage::CacheStore;
use crate::SieveError;
use std::sync::Arc;
use std::time::Duration;

/// Builds a crawler from configuration over an already opened cache
///
/// # Arguments
///
/// * `config` - The configuration
/// * `store` - The cache the crawler reads and writes
///
/// # Returns
///
/// * `Ok(Crawler)` - Ready to process batches
/// * `Err(SieveError)` - The HTTP client could not be built
pub fn build_crawler(config: &Config, store: Arc<dyn CacheStore>) -> Result<Crawler, SieveError> {
    let timeout = Duration::from_millis(config.crawler.request_timeout_ms);
    let client = build_http_client(&config.user_agent, timeout)?;

    Ok(Crawler::new(
        store,
        Fetcher::new(client, timeout),
        PoolPolicy::from_config(&config.crawler),
        FreshnessPolicy::from_hours(config.crawler.failure_ttl_hours),
    ))
}
