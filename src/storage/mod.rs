//! SQLite storage layer.
//!
//! Provides:
//! - Schema initialization and connection pragmas
//! - Serialized transactional batch inserts
//! - Store-full recovery (discard, or archive-and-retry)

pub mod capacity;
pub mod engine;
pub mod schema;
