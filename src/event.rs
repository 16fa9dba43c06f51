//! Log event model.
//!
//! A [`LogEvent`] is the unit accepted by the sink: a timestamped, leveled
//! message with optional exception text and optional structured properties
//! rendered as JSON. Events are immutable once constructed; the producer
//! hands ownership to the sink and never sees them again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity label attached to a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// The label stored in the `Level` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "Trace",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Error => "Error",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event creation time, captured in UTC.
    pub timestamp: DateTime<Utc>,
    /// Severity label.
    pub level: Level,
    /// Fully rendered message text.
    pub message: String,
    /// Exception or backtrace text, if any.
    pub exception: Option<String>,
    /// Structured properties rendered as a JSON object, if any.
    pub properties: Option<String>,
}

impl LogEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            exception: None,
            properties: None,
        }
    }

    /// Override the capture timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach exception text.
    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Attach structured properties, serialized to JSON.
    ///
    /// A value that fails to serialize leaves the event without properties;
    /// constructing an event must not fail on the producer path.
    #[must_use]
    pub fn with_properties<T: Serialize>(mut self, properties: &T) -> Self {
        self.properties = serde_json::to_string(properties).ok();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_level_labels() {
        assert_eq!(Level::Info.as_str(), "Info");
        assert_eq!(Level::Error.to_string(), "Error");
    }

    #[test]
    fn test_properties_serialized_as_json() {
        let mut props = BTreeMap::new();
        props.insert("request_id", "abc-123");
        props.insert("user", "alice");

        let event = LogEvent::new(Level::Info, "request handled").with_properties(&props);
        let json = event.properties.expect("properties should serialize");
        assert_eq!(json, r#"{"request_id":"abc-123","user":"alice"}"#);
    }

    #[test]
    fn test_builder_fields() {
        let event = LogEvent::new(Level::Error, "boom").with_exception("stack trace here");
        assert_eq!(event.message, "boom");
        assert_eq!(event.exception.as_deref(), Some("stack trace here"));
        assert!(event.properties.is_none());
    }
}
