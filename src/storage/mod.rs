//! Storage module for the page cache
//!
//! This module holds the persistent cache of fetch results, including:
//! - SQLite database initialization and schema management
//! - Batched lookups by a set of normalized URLs
//! - Upsert-by-URL of fetch outcomes (failures included)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CacheStore, StorageError, StorageResult};

use crate::state::{FetchOutcome, FreshnessPolicy};
use crate::SieveError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a cache database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SieveError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SieveError> {
    Ok(SqliteStorage::new(path)?)
}

/// Represents one cached page, keyed by its normalized URL
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    /// Response body; empty when the fetch failed or never happened
    pub raw_content: String,
    pub status_code: Option<u16>,
    pub outcome: FetchOutcome,
    pub fetch_error: bool,
    /// Failure reason; empty on success
    pub fetch_message: String,
    /// Set once a fetch completed; marks the record as a cached result
    pub fetched_at: Option<DateTime<Utc>>,
    /// Filled by the content pipeline, never persisted
    pub extracted_content: Option<String>,
    pub extraction_failed: bool,
}

impl PageRecord {
    /// Creates a placeholder for a URL that has not been fetched
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_content: String::new(),
            status_code: None,
            outcome: FetchOutcome::Pending,
            fetch_error: false,
            fetch_message: String::new(),
            fetched_at: None,
            extracted_content: None,
            extraction_failed: false,
        }
    }

    /// Creates the record of a successful fetch
    pub fn fetched(
        url: impl Into<String>,
        status_code: u16,
        raw_content: String,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            raw_content,
            status_code: Some(status_code),
            outcome: FetchOutcome::Fetched,
            fetched_at: Some(fetched_at),
            ..Self::placeholder(url)
        }
    }

    /// Creates the record of a failed fetch
    pub fn failed(
        url: impl Into<String>,
        outcome: FetchOutcome,
        message: impl Into<String>,
        status_code: Option<u16>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(outcome.is_error());
        Self {
            status_code,
            outcome,
            fetch_error: true,
            fetch_message: message.into(),
            fetched_at: Some(fetched_at),
            ..Self::placeholder(url)
        }
    }

    /// Returns true if the record may be served without fetching again
    pub fn is_fresh(&self, policy: &FreshnessPolicy, now: DateTime<Utc>) -> bool {
        policy.is_fresh(self.outcome, self.fetched_at, now)
    }

    /// Returns true if a successful fetch left body content to extract from
    pub fn has_content(&self) -> bool {
        self.outcome.is_success() && !self.raw_content.trim().is_empty()
    }
}
