//! Store connection lifecycle and serialized access.
//!
//! One mutex guards every operation against the database file: batch
//! writes, retention deletes, and rollover. A connection is opened per
//! operation; pragmas and schema creation run on every open, both
//! idempotent.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use thiserror::Error;

use super::schema::{self, format_timestamp};
use crate::config::SinkConfig;
use crate::event::LogEvent;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one transactional batch write.
///
/// The capacity policy dispatches on this instead of inspecting error
/// types.
#[derive(Debug)]
pub enum WriteOutcome {
    /// All entries committed.
    Committed(usize),
    /// The store hit its configured size cap; nothing was committed.
    Full,
    /// Any other engine failure; the transaction rolled back.
    Failed(String),
}

/// Serialized access to the single log table in one SQLite file.
pub struct StoreEngine {
    db_path: PathBuf,
    table: String,
    max_size_bytes: u64,
    timestamps_utc: bool,
    /// The one lock shared by the write and retention paths.
    lock: Mutex<()>,
}

impl StoreEngine {
    /// Build an engine from a validated configuration. No I/O happens here.
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            db_path: config.db_path.clone(),
            table: config.table_name.clone(),
            max_size_bytes: config.max_database_size_mb * 1024 * 1024,
            timestamps_utc: config.store_timestamps_utc,
            lock: Mutex::new(()),
        }
    }

    /// Path of the live database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open the store once so the file and schema exist before the first
    /// flush. Creates the parent directory if needed.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let _guard = self.guard();
        self.open()?;
        tracing::info!(
            db = %self.db_path.display(),
            table = %self.table,
            "log store ready"
        );
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(&self.db_path)?;
        schema::apply_pragmas(&conn, self.max_size_bytes)?;
        schema::initialize_schema(&conn, &self.table)?;
        Ok(conn)
    }

    /// Insert a batch in one transaction, preserving slice order.
    ///
    /// Rolls back on the first failed insert; a batch is committed whole or
    /// not at all.
    pub fn write_batch(&self, batch: &[LogEvent]) -> WriteOutcome {
        let _guard = self.guard();
        match self.insert_all(batch) {
            Ok(count) => WriteOutcome::Committed(count),
            Err(e) if is_full(&e) => WriteOutcome::Full,
            Err(e) => WriteOutcome::Failed(e.to_string()),
        }
    }

    fn insert_all(&self, batch: &[LogEvent]) -> Result<usize, rusqlite::Error> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        {
            let sql = format!(
                "INSERT INTO {} (Timestamp, Level, Exception, RenderedMessage, Properties) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table
            );
            let mut stmt = tx.prepare(&sql)?;
            for event in batch {
                stmt.execute(params![
                    format_timestamp(event.timestamp, self.timestamps_utc),
                    event.level.as_str(),
                    event.exception.as_deref().unwrap_or(""),
                    event.message,
                    event.properties.as_deref().unwrap_or(""),
                ])?;
            }
        }
        tx.commit()?;
        Ok(batch.len())
    }

    /// Delete all entries older than `cutoff` in one statement.
    ///
    /// Returns the number of rows removed.
    pub fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let _guard = self.guard();
        let conn = self.open()?;
        let sql = format!("DELETE FROM {} WHERE Timestamp < ?1", self.table);
        let deleted = conn.execute(&sql, params![format_timestamp(cutoff, self.timestamps_utc)])?;
        Ok(deleted)
    }

    /// Archive the live file and truncate the table, under one lock hold.
    ///
    /// The copy runs with no connection open, so the archive is a complete
    /// snapshot of the last committed state. The table's contents are
    /// deleted; the schema stays in place and freed pages are reused by
    /// subsequent inserts.
    pub fn rollover(&self, archive_path: &Path) -> Result<(), StoreError> {
        let _guard = self.guard();
        std::fs::copy(&self.db_path, archive_path)?;
        let conn = self.open()?;
        conn.execute(&format!("DELETE FROM {}", self.table), [])?;
        Ok(())
    }
}

/// Whether the error is SQLite's store-full signal.
fn is_full(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::DiskFull
    )
}
