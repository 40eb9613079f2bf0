//! Database schema definitions
//!
//! This module contains the SQL schema for the Page-Sieve cache database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per normalized URL; failures are cached too
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    raw_content TEXT NOT NULL DEFAULT '',
    status_code INTEGER,
    outcome TEXT NOT NULL,
    fetch_error INTEGER NOT NULL DEFAULT 0,
    fetch_message TEXT NOT NULL DEFAULT '',
    fetched_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_pages_outcome ON pages(outcome);
CREATE INDEX IF NOT EXISTS idx_pages_fetched_at ON pages(fetched_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_pages_table_exists_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='pages'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
