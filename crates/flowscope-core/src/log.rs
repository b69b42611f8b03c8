//! Runtime log records as seen by the debug bridge.

use serde::{Deserialize, Serialize};

/// Log severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Fine-grained tracing.
    Trace,
    /// Developer diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something suspicious; the runtime continues.
    Warn,
    /// An operation failed.
    Error,
}

impl LogLevel {
    /// Whether records at this level are forwarded to viewers.
    pub fn is_broadcast(self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

/// One record from the runtime's log stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Originating node id, when the record is node-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Rendered log text.
    pub text: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl LogRecord {
    /// Record stamped with the current UTC time.
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            source: None,
            text: text.into(),
            timestamp: chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }

    /// Attach the originating node id.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
