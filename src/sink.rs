//! Sink facade: construction, the producer entry point, and shutdown.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, SinkConfig};
use crate::event::LogEvent;
use crate::queue::EventQueue;
use crate::retention::RetentionEnforcer;
use crate::scheduler::FlushLoop;
use crate::stats::{SinkStats, StatsSnapshot};
use crate::storage::capacity::PersistedBatchSink;
use crate::storage::engine::{StoreEngine, StoreError};

/// Error type for sink construction.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A durable, batched log-event sink backed by a single SQLite file.
///
/// Producers call [`emit`](Self::emit) from any task or thread; a
/// background loop flushes batches to the store, and an optional retention
/// task prunes old entries. Call [`close`](Self::close) to flush buffered
/// events before the process exits; events still queued at a crash are
/// lost.
///
/// Dropping the sink without closing also stops the background tasks after
/// a final flush, but without a bounded wait.
pub struct SqliteSink {
    queue: Arc<EventQueue>,
    stats: Arc<SinkStats>,
    shutdown_tx: watch::Sender<bool>,
    flush_handle: JoinHandle<()>,
    retention_handle: Option<JoinHandle<()>>,
    shutdown_flush_timeout: Duration,
}

impl SqliteSink {
    /// Build the sink and start its background tasks.
    ///
    /// Configuration is validated before any file I/O, so an over-ceiling
    /// size cap fails here with no database file created. The store file
    /// and schema are then created eagerly.
    ///
    /// # Errors
    ///
    /// [`SinkError::Config`] for invalid configuration; [`SinkError::Store`]
    /// if the initial open or schema creation fails.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        config.validate()?;

        let stats = Arc::new(SinkStats::default());
        let engine = Arc::new(StoreEngine::new(&config));
        engine.initialize()?;

        let queue = Arc::new(EventQueue::new(
            config.max_pending_events,
            config.batch_size,
            Arc::clone(&stats),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let batch_sink = Arc::new(PersistedBatchSink::new(
            Arc::clone(&engine),
            config.rollover_enabled,
            Arc::clone(&stats),
        ));
        let flush_handle = FlushLoop::spawn(
            Arc::clone(&queue),
            batch_sink,
            &config,
            shutdown_rx.clone(),
        );

        let retention_handle = config.retention.map(|policy| {
            RetentionEnforcer::spawn(
                Arc::clone(&engine),
                policy,
                Arc::clone(&stats),
                shutdown_rx,
            )
        });

        Ok(Self {
            queue,
            stats,
            shutdown_tx,
            flush_handle,
            retention_handle,
            shutdown_flush_timeout: config.shutdown_flush_timeout,
        })
    }

    /// Accept one event.
    ///
    /// Never blocks and never fails: when the buffer is full the event is
    /// dropped and counted.
    pub fn emit(&self, event: LogEvent) {
        self.stats.record_emitted();
        self.queue.push(event);
    }

    /// Point-in-time snapshot of the sink's self-diagnostic counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of events waiting in the buffer.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Stop the background tasks, flushing buffered events with a bounded
    /// wait.
    ///
    /// Events still unflushed when the bound expires are abandoned. An
    /// in-flight transaction is not aborted; it completes on the blocking
    /// pool.
    pub async fn close(self) {
        let _ = self.shutdown_tx.send(true);

        let mut flush_handle = self.flush_handle;
        match tokio::time::timeout(self.shutdown_flush_timeout, &mut flush_handle).await {
            Ok(_) => {}
            Err(_) => {
                flush_handle.abort();
                tracing::warn!("final flush exceeded its bound, abandoning remaining events");
            }
        }

        if let Some(handle) = self.retention_handle {
            let _ = handle.await;
        }
    }
}
