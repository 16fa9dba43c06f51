//! Silt: a durable, batched log-event sink backed by embedded SQLite.
//!
//! Producers hand [`LogEvent`]s to [`SqliteSink::emit`], which never blocks
//! and never fails. A background flush loop drains the bounded in-memory
//! buffer into transactional batch inserts; a size cap with optional
//! rollover bounds the store file, and an optional retention sweep prunes
//! old entries.
//!
//! # Modules
//!
//! - [`config`]: sink configuration and validation
//! - [`event`]: the log event model
//! - [`queue`]: bounded producer-side buffer
//! - [`scheduler`]: background flush loop
//! - [`retention`]: age-based retention sweep
//! - [`sink`]: the public sink facade
//! - [`stats`]: self-diagnostic counters
//! - [`storage`]: SQLite persistence layer
//!
//! # Example
//!
//! ```no_run
//! use silt::{Level, LogEvent, SinkConfig, SqliteSink};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), silt::SinkError> {
//! let sink = SqliteSink::new(SinkConfig::new("logs.db"))?;
//! sink.emit(LogEvent::new(Level::Info, "service started"));
//! sink.close().await;
//! # Ok(())
//! # }
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // config::SinkConfig is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod config;
pub mod event;
pub mod queue;
pub mod retention;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod storage;

pub use config::{ConfigError, SinkConfig};
pub use event::{Level, LogEvent};
pub use retention::RetentionPolicy;
pub use scheduler::BatchSink;
pub use sink::{SinkError, SqliteSink};
pub use stats::StatsSnapshot;
pub use storage::engine::WriteOutcome;
