//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CacheStore trait.

use crate::state::FetchOutcome;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CacheStore, StorageError, StorageResult};
use crate::storage::PageRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Maximum number of bound parameters per `IN (...)` lookup
const LOOKUP_CHUNK: usize = 500;

const SELECT_COLUMNS: &str =
    "url, raw_content, status_code, outcome, fetch_error, fetch_message, fetched_at";

/// SQLite storage backend
///
/// The connection sits behind a mutex so one storage can be shared across
/// concurrent batch calls.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for tests and throwaway runs)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection mutex poisoned".to_string()))
    }
}

/// Columns of a `pages` row before validation
struct RawRow {
    url: String,
    raw_content: String,
    status_code: Option<u16>,
    outcome: String,
    fetch_error: bool,
    fetch_message: String,
    fetched_at: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            raw_content: row.get(1)?,
            status_code: row.get(2)?,
            outcome: row.get(3)?,
            fetch_error: row.get::<_, i64>(4)? != 0,
            fetch_message: row.get(5)?,
            fetched_at: row.get(6)?,
        })
    }

    fn into_record(self) -> StorageResult<PageRecord> {
        let outcome =
            FetchOutcome::from_db_string(&self.outcome).ok_or_else(|| StorageError::Corrupt {
                url: self.url.clone(),
                message: format!("unknown outcome '{}'", self.outcome),
            })?;

        let fetched_at = match self.fetched_at {
            Some(text) => Some(
                DateTime::parse_from_rfc3339(&text)
                    .map_err(|e| StorageError::Corrupt {
                        url: self.url.clone(),
                        message: format!("bad fetched_at '{}': {}", text, e),
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(PageRecord {
            url: self.url,
            raw_content: self.raw_content,
            status_code: self.status_code,
            outcome,
            fetch_error: self.fetch_error,
            fetch_message: self.fetch_message,
            fetched_at,
            extracted_content: None,
            extraction_failed: false,
        })
    }
}

/// Fixed-width UTC timestamps so text comparison matches time order
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn upsert_with(conn: &Connection, record: &PageRecord) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO pages (url, raw_content, status_code, outcome, fetch_error, fetch_message, fetched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(url) DO UPDATE SET
            raw_content = excluded.raw_content,
            status_code = excluded.status_code,
            outcome = excluded.outcome,
            fetch_error = excluded.fetch_error,
            fetch_message = excluded.fetch_message,
            fetched_at = excluded.fetched_at",
        params![
            record.url,
            record.raw_content,
            record.status_code,
            record.outcome.to_db_string(),
            record.fetch_error as i64,
            record.fetch_message,
            record.fetched_at.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

impl CacheStore for SqliteStorage {
    fn lookup_many(&self, urls: &[String]) -> StorageResult<HashMap<String, PageRecord>> {
        let mut found = HashMap::new();
        if urls.is_empty() {
            return Ok(found);
        }

        let conn = self.lock()?;
        for chunk in urls.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM pages WHERE url IN ({})",
                SELECT_COLUMNS, placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), RawRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            for raw in rows {
                let record = raw.into_record()?;
                found.insert(record.url.clone(), record);
            }
        }

        Ok(found)
    }

    fn upsert(&self, record: &PageRecord) -> StorageResult<()> {
        let conn = self.lock()?;
        upsert_with(&conn, record)
    }

    fn upsert_many(&self, records: &[PageRecord]) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for record in records {
            upsert_with(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_total(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_outcome(&self, outcome: FetchOutcome) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE outcome = ?1",
            params![outcome.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_retryable_before(&self, cutoff: DateTime<Utc>) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages
             WHERE outcome IN (?2, ?3) AND fetched_at IS NOT NULL AND fetched_at < ?1",
            params![
                format_timestamp(&cutoff),
                FetchOutcome::TransportFailure.to_db_string(),
                FetchOutcome::HttpStatusFailure.to_db_string(),
            ],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
