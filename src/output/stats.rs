//! Statistics generation from the page cache
//!
//! This module provides functionality for extracting and displaying
//! cache statistics from the storage layer.

use crate::state::{FetchOutcome, FreshnessPolicy};
use crate::storage::CacheStore;
use crate::SieveError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Cache statistics summary
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    /// Total number of cached records
    pub total_pages: u64,

    /// Count of records by fetch outcome
    pub pages_by_outcome: HashMap<FetchOutcome, u64>,

    /// Failed records the freshness policy would fetch again
    pub stale_failures: u64,
}

impl CacheStatistics {
    pub fn failures(&self) -> u64 {
        self.pages_by_outcome
            .iter()
            .filter(|(outcome, _)| outcome.is_error())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The cache to query
/// * `freshness` - Policy deciding which failures count as stale
/// * `now` - Reference time for staleness
///
/// # Returns
///
/// * `Ok(CacheStatistics)` - Successfully loaded statistics
/// * `Err(SieveError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn CacheStore,
    freshness: &FreshnessPolicy,
    now: DateTime<Utc>,
) -> Result<CacheStatistics, SieveError> {
    let total_pages = storage.count_total()?;

    let mut pages_by_outcome = HashMap::new();
    for outcome in FetchOutcome::all() {
        let count = storage.count_by_outcome(outcome)?;
        if count > 0 {
            pages_by_outcome.insert(outcome, count);
        }
    }

    let stale_failures = match freshness.failure_ttl {
        Some(ttl) => storage.count_retryable_before(now - ttl)?,
        None => 0,
    };

    Ok(CacheStatistics {
        total_pages,
        pages_by_outcome,
        stale_failures,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CacheStatistics) {
    println!("=== Cache Statistics ===\n");

    println!("Overview:");
    println!("  Total pages cached: {}", stats.total_pages);
    println!("  Failed fetches: {}", stats.failures());
    println!("  Failures due for retry: {}", stats.stale_failures);
    println!();

    println!("Pages by Outcome:");
    // Sort outcomes by count (descending)
    let mut outcome_counts: Vec<_> = stats.pages_by_outcome.iter().collect();
    outcome_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (outcome, count) in outcome_counts {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
}
