//! Store-full policy: discard or archive-and-retry.
//!
//! Wraps the engine as the flush loop's [`BatchSink`]. Every batch is
//! handled exactly once here: committed, or discarded after the configured
//! recovery. Nothing propagates back to the scheduler, so a permanently
//! full store never turns into a retry storm.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};

use super::engine::{StoreEngine, WriteOutcome};
use crate::event::LogEvent;
use crate::scheduler::BatchSink;
use crate::stats::SinkStats;

/// [`BatchSink`] that writes through the store engine and applies the
/// capacity policy on a full store.
pub struct PersistedBatchSink {
    engine: Arc<StoreEngine>,
    rollover_enabled: bool,
    stats: Arc<SinkStats>,
}

impl PersistedBatchSink {
    pub fn new(engine: Arc<StoreEngine>, rollover_enabled: bool, stats: Arc<SinkStats>) -> Self {
        Self {
            engine,
            rollover_enabled,
            stats,
        }
    }

    /// Archive the full store and retry the batch once against the emptied
    /// table. The batch stays whole: it lands entirely in the fresh store
    /// or not at all.
    fn rollover_and_retry(&self, batch: &[LogEvent]) -> usize {
        let archive = archive_path(self.engine.db_path(), Local::now());
        if let Err(e) = self.engine.rollover(&archive) {
            tracing::error!(error = %e, events = batch.len(), "rollover failed, discarding batch");
            self.stats.record_discarded();
            return 0;
        }
        self.stats.record_rollover();
        tracing::info!(archive = %archive.display(), "store full, rolled over to archive");

        match self.engine.write_batch(batch) {
            WriteOutcome::Committed(count) => {
                self.stats.record_persisted(count as u64);
                count
            }
            WriteOutcome::Full => {
                tracing::warn!(
                    events = batch.len(),
                    "store full again after rollover, discarding batch"
                );
                self.stats.record_discarded();
                0
            }
            WriteOutcome::Failed(detail) => {
                tracing::warn!(
                    error = %detail,
                    events = batch.len(),
                    "retry after rollover failed, discarding batch"
                );
                self.stats.record_discarded();
                0
            }
        }
    }
}

impl BatchSink for PersistedBatchSink {
    fn store_batch(&self, batch: Vec<LogEvent>) -> usize {
        match self.engine.write_batch(&batch) {
            WriteOutcome::Committed(count) => {
                self.stats.record_persisted(count as u64);
                tracing::debug!(events = count, "batch committed");
                count
            }
            WriteOutcome::Failed(detail) => {
                tracing::warn!(
                    error = %detail,
                    events = batch.len(),
                    "batch write failed, discarding batch"
                );
                self.stats.record_discarded();
                0
            }
            WriteOutcome::Full if !self.rollover_enabled => {
                tracing::warn!(
                    events = batch.len(),
                    "store full and rollover disabled, discarding batch"
                );
                self.stats.record_discarded();
                0
            }
            WriteOutcome::Full => self.rollover_and_retry(&batch),
        }
    }
}

/// Archive file name: `<stem>-<yyyymmdd_hhmmss.ff><ext>`.
///
/// Sub-second precision keeps rapid successive rollovers from colliding.
fn archive_path(db_path: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log");
    let ext = db_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let centis = now.timestamp_subsec_millis() / 10;
    let name = format!("{stem}-{}.{centis:02}{ext}", now.format("%Y%m%d_%H%M%S"));
    db_path.with_file_name(name)
}
