//! Test utilities and fixtures for silt tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - Raw SQLite query helpers for asserting on stored rows
//! - An async wait-for-condition helper

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::TempDir;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Number of rows currently in the log table.
    pub fn row_count(&self) -> i64 {
        row_count(&self.db_path, "Logs")
    }

    /// Rendered messages in id order.
    pub fn messages(&self) -> Vec<String> {
        messages(&self.db_path, "Logs")
    }

    /// Files in the database directory whose names mark them as rollover
    /// archives of `test.db`.
    pub fn archive_files(&self) -> Vec<PathBuf> {
        let mut archives: Vec<PathBuf> = std::fs::read_dir(self.temp_dir.path())
            .expect("failed to read temp dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with("test-") && name.ends_with(".db")
            })
            .collect();
        archives.sort();
        archives
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Count rows in `table` at `db_path`.
pub fn row_count(db_path: &Path, table: &str) -> i64 {
    let conn = Connection::open(db_path).expect("failed to open database");
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .expect("count query failed")
}

/// Rendered messages in id order from `table` at `db_path`.
pub fn messages(db_path: &Path, table: &str) -> Vec<String> {
    let conn = Connection::open(db_path).expect("failed to open database");
    let mut stmt = conn
        .prepare(&format!(
            "SELECT RenderedMessage FROM {table} ORDER BY id ASC"
        ))
        .expect("prepare failed");
    stmt.query_map([], |row| row.get(0))
        .expect("query failed")
        .collect::<Result<Vec<String>, _>>()
        .expect("row mapping failed")
}

/// Stored timestamps in id order from the default table.
pub fn timestamps(db_path: &Path) -> Vec<String> {
    let conn = Connection::open(db_path).expect("failed to open database");
    let mut stmt = conn
        .prepare("SELECT Timestamp FROM Logs ORDER BY id ASC")
        .expect("prepare failed");
    stmt.query_map([], |row| row.get(0))
        .expect("query failed")
        .collect::<Result<Vec<String>, _>>()
        .expect("row mapping failed")
}

/// Wait for a condition to become true with timeout.
///
/// Returns `true` if the condition was met, `false` if the timeout expired.
pub async fn wait_for<F>(timeout: std::time::Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
