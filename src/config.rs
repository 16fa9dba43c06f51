//! Sink configuration and validation.
//!
//! Supports:
//! - Sensible defaults for quick start
//! - Fail-fast validation against the storage engine's size ceiling

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::retention::RetentionPolicy;
use crate::storage::schema::MAX_DATABASE_SIZE_MB;

/// Error type for sink configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max database size {requested} MB exceeds the engine limit of {ceiling} MB")]
    MaxSizeExceeded { requested: u64, ceiling: u64 },

    #[error("max database size must be at least 1 MB")]
    MaxSizeZero,

    #[error("batch size must be greater than zero")]
    ZeroBatchSize,

    #[error("buffer capacity must be greater than zero")]
    ZeroBufferCapacity,

    #[error("table name '{0}' is not a plain SQL identifier")]
    InvalidTableName(String),
}

/// Configuration for a [`crate::SqliteSink`].
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,

    /// Name of the log table. Must be a plain SQL identifier.
    pub table_name: String,

    /// Events per flush transaction.
    pub batch_size: usize,

    /// Maximum number of events buffered in memory; incoming events beyond
    /// this are dropped.
    pub max_pending_events: usize,

    /// Interval between timer-driven flushes, bounding latency for
    /// low-volume streams.
    pub flush_interval: Duration,

    /// Bounded wait for the final flush during shutdown.
    pub shutdown_flush_timeout: Duration,

    /// Maximum database size in megabytes.
    pub max_database_size_mb: u64,

    /// Archive-and-truncate instead of discarding once the store is full.
    pub rollover_enabled: bool,

    /// Optional age-based retention sweep.
    pub retention: Option<RetentionPolicy>,

    /// Store timestamps in UTC instead of local time.
    pub store_timestamps_utc: bool,
}

impl SinkConfig {
    /// Configuration for the given database path with default settings.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            table_name: "Logs".into(),
            batch_size: 100,
            max_pending_events: 100_000,
            flush_interval: Duration::from_secs(5),
            shutdown_flush_timeout: Duration::from_secs(5),
            max_database_size_mb: 10,
            rollover_enabled: true,
            retention: None,
            store_timestamps_utc: false,
        }
    }

    /// Validate the configuration.
    ///
    /// Called by the sink constructor before any file I/O, so an
    /// over-ceiling size cap never creates a database file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first value out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_database_size_mb == 0 {
            return Err(ConfigError::MaxSizeZero);
        }
        if self.max_database_size_mb > MAX_DATABASE_SIZE_MB {
            return Err(ConfigError::MaxSizeExceeded {
                requested: self.max_database_size_mb,
                ceiling: MAX_DATABASE_SIZE_MB,
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_pending_events == 0 {
            return Err(ConfigError::ZeroBufferCapacity);
        }
        if !is_identifier(&self.table_name) {
            return Err(ConfigError::InvalidTableName(self.table_name.clone()));
        }
        Ok(())
    }
}

/// Whether `name` is safe to splice into SQL as a table name.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SinkConfig::new("logs.db");
        assert_eq!(config.table_name, "Logs");
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_pending_events, 100_000);
        assert_eq!(config.max_database_size_mb, 10);
        assert!(config.rollover_enabled);
        assert!(config.retention.is_none());
        assert!(!config.store_timestamps_utc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_size_over_ceiling_rejected() {
        let mut config = SinkConfig::new("logs.db");
        config.max_database_size_mb = MAX_DATABASE_SIZE_MB + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxSizeExceeded { .. })
        ));
    }

    #[test]
    fn test_size_at_ceiling_accepted() {
        let mut config = SinkConfig::new("logs.db");
        config.max_database_size_mb = MAX_DATABASE_SIZE_MB;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = SinkConfig::new("logs.db");
        config.max_database_size_mb = 0;
        assert!(matches!(config.validate(), Err(ConfigError::MaxSizeZero)));

        let mut config = SinkConfig::new("logs.db");
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBatchSize)));

        let mut config = SinkConfig::new("logs.db");
        config.max_pending_events = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroBufferCapacity)
        ));
    }

    #[test]
    fn test_table_name_validation() {
        for bad in ["", "1logs", "logs;drop", "log table", "logs-2024"] {
            let mut config = SinkConfig::new("logs.db");
            config.table_name = (*bad).into();
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidTableName(_))),
                "table name '{bad}' should be rejected"
            );
        }

        for good in ["Logs", "_staging", "app_logs_2024"] {
            let mut config = SinkConfig::new("logs.db");
            config.table_name = (*good).into();
            assert!(config.validate().is_ok(), "table name '{good}' should pass");
        }
    }
}
