//! Schema DDL, connection pragmas, and engine size limits.

use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;

/// Page size applied to new database files.
pub const PAGE_SIZE: u64 = 4096;

/// Largest page count the engine will address.
pub const MAX_PAGE_COUNT: u64 = 1_280_000;

/// Hard ceiling on the configurable database size, in megabytes.
///
/// Derived from the page-size and page-count limits above; requests beyond
/// it are rejected at configuration time.
pub const MAX_DATABASE_SIZE_MB: u64 = PAGE_SIZE * MAX_PAGE_COUNT / (1024 * 1024);

/// Timestamp column format. Fixed-width and lexically sortable, which the
/// retention range delete relies on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Apply per-connection pragmas.
///
/// `max_page_count` enforces the configured size cap: an insert that would
/// grow the file past it fails with `SQLITE_FULL`. The rollback journal
/// (rather than WAL) keeps all committed state in the single database
/// file, so an archive copy taken between transactions is complete.
pub fn apply_pragmas(conn: &Connection, max_size_bytes: u64) -> rusqlite::Result<()> {
    let max_pages = (max_size_bytes / PAGE_SIZE).max(1);
    conn.pragma_update(None, "page_size", PAGE_SIZE as i64)?;
    conn.pragma_update(None, "max_page_count", max_pages as i64)?;
    // journal_mode reports the resulting mode as a row.
    let _mode: String = conn.query_row("PRAGMA journal_mode = TRUNCATE", [], |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Create the log table if it does not already exist.
///
/// Idempotent; runs on every connection open.
pub fn initialize_schema(conn: &Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            Timestamp TEXT,
            Level VARCHAR(10),
            Exception TEXT,
            RenderedMessage TEXT,
            Properties TEXT
        );
        "#
    ))
}

/// Render a timestamp in the fixed column format, in UTC or local time.
pub fn format_timestamp(timestamp: DateTime<Utc>, utc: bool) -> String {
    if utc {
        timestamp.format(TIMESTAMP_FORMAT).to_string()
    } else {
        timestamp
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}
