//! Background flush loop.
//!
//! A single task drains the event queue into batches and hands them to a
//! pluggable [`BatchSink`]. Two triggers, whichever fires first:
//! - the queue has accumulated a full batch
//! - the periodic flush tick (bounds latency for low-volume streams)
//!
//! Flush cycles are serialized by construction: this is the only task that
//! writes, so batch N commits or is discarded before batch N+1 starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SinkConfig;
use crate::event::LogEvent;
use crate::queue::EventQueue;

/// Capability to persist one drained batch.
///
/// Implementations own their failure handling: a batch that cannot be
/// stored is discarded and reported on the diagnostics channel, never
/// returned to the scheduler.
pub trait BatchSink: Send + Sync + 'static {
    /// Persist one batch, returning the number of events actually stored.
    fn store_batch(&self, batch: Vec<LogEvent>) -> usize;
}

/// The background task draining the queue into a [`BatchSink`].
pub(crate) struct FlushLoop<S: BatchSink> {
    queue: Arc<EventQueue>,
    sink: Arc<S>,
    batch_size: usize,
    flush_interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: BatchSink> FlushLoop<S> {
    /// Spawn the flush loop on the current tokio runtime.
    pub fn spawn(
        queue: Arc<EventQueue>,
        sink: Arc<S>,
        config: &SinkConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let flush_loop = Self {
            queue,
            sink,
            batch_size: config.batch_size,
            flush_interval: config.flush_interval,
            shutdown_rx,
        };
        tokio::spawn(flush_loop.run())
    }

    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; consume it so the loop
        // starts by waiting for data.
        ticker.tick().await;

        let queue = Arc::clone(&self.queue);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = queue.batch_ready() => {}
                _ = self.shutdown_rx.changed() => break,
            }
            self.flush_pending().await;
        }

        // Final best-effort drain; the facade bounds how long it may run.
        self.flush_pending().await;
        tracing::debug!("flush loop stopped");
    }

    /// Drain and write until the queue is empty.
    ///
    /// Writes run on the blocking pool; this task waits for each batch to
    /// be handled before draining the next, keeping transactions ordered.
    async fn flush_pending(&self) {
        loop {
            let batch = self.queue.drain(self.batch_size);
            if batch.is_empty() {
                break;
            }
            let sink = Arc::clone(&self.sink);
            if let Err(e) = tokio::task::spawn_blocking(move || sink.store_batch(batch)).await {
                tracing::error!(error = %e, "batch writer task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;
    use crate::stats::SinkStats;
    use std::sync::Mutex;

    /// Sink stub recording every batch it receives.
    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingSink {
        fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }

        fn total_events(&self) -> usize {
            self.batches.lock().unwrap().iter().map(Vec::len).sum()
        }
    }

    impl BatchSink for RecordingSink {
        fn store_batch(&self, batch: Vec<LogEvent>) -> usize {
            let messages = batch.into_iter().map(|e| e.message).collect::<Vec<_>>();
            let count = messages.len();
            self.batches.lock().unwrap().push(messages);
            count
        }
    }

    fn test_queue(batch_size: usize) -> Arc<EventQueue> {
        Arc::new(EventQueue::new(
            10_000,
            batch_size,
            Arc::new(SinkStats::default()),
        ))
    }

    fn config(batch_size: usize, flush_interval: Duration) -> SinkConfig {
        let mut config = SinkConfig::new("unused.db");
        config.batch_size = batch_size;
        config.flush_interval = flush_interval;
        config
    }

    async fn wait_until<F: FnMut() -> bool>(mut condition: F) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(std::time::Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_flush_on_batch_threshold() {
        let queue = test_queue(3);
        let sink = Arc::new(RecordingSink::default());
        // Hour-long tick: only the size trigger can flush.
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _handle = FlushLoop::spawn(
            Arc::clone(&queue),
            Arc::clone(&sink),
            &config(3, Duration::from_secs(3600)),
            shutdown_rx,
        );

        for i in 0..3 {
            queue.push(LogEvent::new(Level::Info, format!("m{i}")));
        }

        wait_until(|| sink.total_events() == 3).await;
        assert_eq!(sink.batches(), vec![vec!["m0", "m1", "m2"]]);
    }

    #[tokio::test]
    async fn test_flush_on_timer_tick() {
        let queue = test_queue(100);
        let sink = Arc::new(RecordingSink::default());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let _handle = FlushLoop::spawn(
            Arc::clone(&queue),
            Arc::clone(&sink),
            &config(100, Duration::from_millis(50)),
            shutdown_rx,
        );

        // One event, far below the batch size: the tick must flush it.
        queue.push(LogEvent::new(Level::Info, "lonely"));

        wait_until(|| sink.total_events() == 1).await;
        assert_eq!(sink.batches(), vec![vec!["lonely"]]);
    }

    #[tokio::test]
    async fn test_shutdown_drains_remaining_events() {
        let queue = test_queue(100);
        let sink = Arc::new(RecordingSink::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = FlushLoop::spawn(
            Arc::clone(&queue),
            Arc::clone(&sink),
            &config(100, Duration::from_secs(3600)),
            shutdown_rx,
        );

        queue.push(LogEvent::new(Level::Info, "a"));
        queue.push(LogEvent::new(Level::Info, "b"));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.total_events(), 2);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_large_backlog_split_into_batches() {
        let queue = test_queue(10);
        let sink = Arc::new(RecordingSink::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        for i in 0..25 {
            queue.push(LogEvent::new(Level::Info, format!("m{i}")));
        }

        let handle = FlushLoop::spawn(
            Arc::clone(&queue),
            Arc::clone(&sink),
            &config(10, Duration::from_secs(3600)),
            shutdown_rx,
        );
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let batches = sink.batches();
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 25);
        assert!(batches.iter().all(|b| b.len() <= 10));
        // Order is preserved across batch boundaries.
        let flat: Vec<String> = batches.into_iter().flatten().collect();
        let expected: Vec<String> = (0..25).map(|i| format!("m{i}")).collect();
        assert_eq!(flat, expected);
    }
}
