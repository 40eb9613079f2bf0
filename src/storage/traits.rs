//! Storage traits and error types
//!
//! This module defines the trait interface for cache backends and
//! associated error types.

use crate::state::FetchOutcome;
use crate::storage::PageRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record for {url}: {message}")]
    Corrupt { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page cache backends
///
/// Records are keyed by normalized URL. Implementations must be safe to share
/// between concurrent batch calls; upserts of distinct keys must not conflict
/// and the last writer wins on the same key.
pub trait CacheStore: Send + Sync {
    /// Looks up many URLs at once
    ///
    /// Only URLs with a stored record appear in the returned map.
    fn lookup_many(&self, urls: &[String]) -> StorageResult<HashMap<String, PageRecord>>;

    /// Looks up a single URL
    fn get(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let mut found = self.lookup_many(&[url.to_string()])?;
        Ok(found.remove(url))
    }

    /// Inserts or replaces the record stored under `record.url`
    fn upsert(&self, record: &PageRecord) -> StorageResult<()>;

    /// Upserts a batch of records
    ///
    /// Backends should apply the batch atomically when they can.
    fn upsert_many(&self, records: &[PageRecord]) -> StorageResult<()> {
        for record in records {
            self.upsert(record)?;
        }
        Ok(())
    }

    // ===== Statistics =====

    /// Gets total record count
    fn count_total(&self) -> StorageResult<u64>;

    /// Counts records by fetch outcome
    fn count_by_outcome(&self, outcome: FetchOutcome) -> StorageResult<u64>;

    /// Counts retryable failures fetched before `cutoff`
    fn count_retryable_before(&self, cutoff: DateTime<Utc>) -> StorageResult<u64>;
}
