//! Age-based retention sweep.
//!
//! An independent periodic task deletes entries older than the configured
//! period. Sweeps acquire the same store lock as the write path; a failed
//! sweep is logged and the timer keeps ticking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::stats::SinkStats;
use crate::storage::engine::StoreEngine;

/// Floor applied to the effective retention period.
pub const RETENTION_PERIOD_FLOOR: Duration = Duration::from_secs(30 * 60);

/// Granularity step for the sweep interval.
pub const SWEEP_INTERVAL_STEP: Duration = Duration::from_secs(15 * 60);

/// Age-based retention policy.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Minimum age before an entry becomes eligible for deletion.
    pub period: Duration,
    /// Requested interval between sweeps; see [`Self::sweep_interval`] for
    /// the applied quantization.
    pub check_interval: Option<Duration>,
}

impl RetentionPolicy {
    /// Delete entries older than `period`, sweeping at the default
    /// interval.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            check_interval: None,
        }
    }

    /// Request a specific sweep interval.
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = Some(interval);
        self
    }

    /// Retention period actually enforced.
    ///
    /// Requested periods below thirty minutes are raised to the floor, so a
    /// five-minute request keeps thirty minutes of data. Kept for
    /// compatibility with existing deployments.
    #[must_use]
    pub fn effective_period(&self) -> Duration {
        self.period.max(RETENTION_PERIOD_FLOOR)
    }

    /// Interval between sweeps.
    ///
    /// The requested interval is floored to fifteen minutes, then truncated
    /// down to a whole multiple of fifteen minutes; with no request the
    /// floor itself is used.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        let requested = self
            .check_interval
            .unwrap_or(SWEEP_INTERVAL_STEP)
            .max(SWEEP_INTERVAL_STEP);
        let steps = requested.as_secs() / SWEEP_INTERVAL_STEP.as_secs();
        Duration::from_secs(steps * SWEEP_INTERVAL_STEP.as_secs())
    }
}

/// Periodic task deleting entries past their retention period.
pub(crate) struct RetentionEnforcer {
    engine: Arc<StoreEngine>,
    policy: RetentionPolicy,
    stats: Arc<SinkStats>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RetentionEnforcer {
    /// Spawn the enforcer on the current tokio runtime.
    ///
    /// The first sweep runs immediately; later sweeps follow the quantized
    /// interval.
    pub fn spawn(
        engine: Arc<StoreEngine>,
        policy: RetentionPolicy,
        stats: Arc<SinkStats>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let enforcer = Self {
            engine,
            policy,
            stats,
            shutdown_rx,
        };
        tokio::spawn(enforcer.run())
    }

    async fn run(mut self) {
        let interval = self.policy.sweep_interval();
        tracing::info!(
            period_secs = self.policy.effective_period().as_secs(),
            interval_secs = interval.as_secs(),
            "retention enforcer armed"
        );

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep().await,
                _ = self.shutdown_rx.changed() => break,
            }
        }
        tracing::debug!("retention enforcer stopped");
    }

    async fn sweep(&self) {
        let age = chrono::Duration::seconds(self.policy.effective_period().as_secs() as i64);
        let cutoff = Utc::now() - age;

        let engine = Arc::clone(&self.engine);
        match tokio::task::spawn_blocking(move || engine.delete_older_than(cutoff)).await {
            Ok(Ok(deleted)) => {
                self.stats.record_retention_deleted(deleted as u64);
                tracing::info!(deleted, "retention sweep complete");
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "retention sweep failed"),
            Err(e) => tracing::error!(error = %e, "retention sweep task failed"),
        }
    }
}
