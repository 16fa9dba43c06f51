//! Self-diagnostic counters.
//!
//! The sink never surfaces failures to producers, so the policies that act
//! silently (overflow drops, batch discards, rollover) are observable here
//! and on the tracing channel.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counter block updated by every sink component.
#[derive(Debug, Default)]
pub struct SinkStats {
    events_emitted: AtomicU64,
    events_dropped: AtomicU64,
    events_persisted: AtomicU64,
    batches_committed: AtomicU64,
    batches_discarded: AtomicU64,
    rollovers: AtomicU64,
    retention_deleted: AtomicU64,
}

impl SinkStats {
    pub(crate) fn record_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one overflow drop, returning the running total.
    pub(crate) fn record_dropped(&self) -> u64 {
        self.events_dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_persisted(&self, events: u64) {
        self.events_persisted.fetch_add(events, Ordering::Relaxed);
        self.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self) {
        self.batches_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollover(&self) {
        self.rollovers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retention_deleted(&self, rows: u64) {
        self.retention_deleted.fetch_add(rows, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_persisted: self.events_persisted.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            batches_discarded: self.batches_discarded.load(Ordering::Relaxed),
            rollovers: self.rollovers.load(Ordering::Relaxed),
            retention_deleted: self.retention_deleted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the sink's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Events accepted by `emit`, including ones later dropped.
    pub events_emitted: u64,
    /// Events dropped because the buffer was full.
    pub events_dropped: u64,
    /// Events committed to the store.
    pub events_persisted: u64,
    /// Batches committed.
    pub batches_committed: u64,
    /// Batches discarded after a write failure or full store.
    pub batches_discarded: u64,
    /// Archive-and-truncate rollovers performed.
    pub rollovers: u64,
    /// Rows removed by retention sweeps.
    pub retention_deleted: u64,
}
