//! Bounded in-memory buffer between producers and the flush loop.
//!
//! Producers push from any thread without blocking; the flush loop drains
//! FIFO batches. When the buffer is at capacity the incoming event is
//! dropped and counted, never surfaced to the producer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::event::LogEvent;
use crate::stats::SinkStats;

/// Bounded, thread-safe FIFO buffer of pending log events.
pub struct EventQueue {
    inner: Mutex<VecDeque<LogEvent>>,
    capacity: usize,
    batch_size: usize,
    batch_ready: Notify,
    overflow_reported: AtomicBool,
    stats: Arc<SinkStats>,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` events.
    pub fn new(capacity: usize, batch_size: usize, stats: Arc<SinkStats>) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(batch_size.min(capacity))),
            capacity,
            batch_size,
            batch_ready: Notify::new(),
            overflow_reported: AtomicBool::new(false),
            stats,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEvent>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event, dropping it if the buffer is full.
    ///
    /// Never blocks beyond the internal lock and never fails. Overflow is
    /// counted and reported once per overflow episode.
    pub fn push(&self, event: LogEvent) {
        let pending = {
            let mut inner = self.lock();
            if inner.len() >= self.capacity {
                drop(inner);
                let dropped = self.stats.record_dropped();
                if !self.overflow_reported.swap(true, Ordering::Relaxed) {
                    tracing::warn!(
                        capacity = self.capacity,
                        dropped_total = dropped,
                        "event buffer full, dropping incoming events"
                    );
                }
                return;
            }
            inner.push_back(event);
            inner.len()
        };

        if pending >= self.batch_size {
            self.batch_ready.notify_one();
        }
    }

    /// Atomically remove and return up to `max` events in FIFO order.
    pub fn drain(&self, max: usize) -> Vec<LogEvent> {
        let mut inner = self.lock();
        let take = max.min(inner.len());
        let batch: Vec<LogEvent> = inner.drain(..take).collect();
        if inner.is_empty() {
            self.overflow_reported.store(false, Ordering::Relaxed);
        }
        batch
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until at least one full batch has accumulated.
    ///
    /// Used by the flush loop alongside its periodic tick; a stored wakeup
    /// is consumed by the next caller, so a spurious extra wake at most
    /// drains an empty queue.
    pub async fn batch_ready(&self) {
        self.batch_ready.notified().await;
    }
}
