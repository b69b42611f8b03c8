//! Flow message and debug envelope wire types.

use serde::{Deserialize, Serialize};

use crate::log::LogLevel;
use crate::value::FlowValue;

/// A message handed to a debug node by the flow engine.
///
/// `topic` and `path` pass through to the envelope unchanged; `payload`
/// is the designated data field. An absent payload is modeled as `None`.
#[derive(Clone, Debug, Default)]
pub struct FlowMessage {
    /// Optional routing topic.
    pub topic: Option<String>,
    /// The message's data field.
    pub payload: Option<FlowValue>,
    /// Internal correlation path, opaque to this module.
    pub path: Option<String>,
}

impl FlowMessage {
    /// Message with the given payload and nothing else.
    pub fn new(payload: FlowValue) -> Self {
        Self {
            topic: None,
            payload: Some(payload),
            path: None,
        }
    }

    /// Set the topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the correlation path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// One event on the viewer wire.
///
/// Built fresh per emission and dropped after serialization; envelopes
/// are never stored. `msg` is always a bounded display string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugEnvelope {
    /// Originating node (or log source) identifier.
    pub id: String,
    /// Node display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Message topic, passed through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Formatted display value.
    pub msg: String,
    /// Correlation path, passed through.
    #[serde(rename = "_path", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Severity tag, present only on log-originated envelopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
}

impl DebugEnvelope {
    /// Envelope for node-originated output.
    pub fn from_node(
        id: impl Into<String>,
        name: Option<String>,
        topic: Option<String>,
        msg: String,
        path: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name,
            topic,
            msg,
            path,
            level: None,
        }
    }

    /// Envelope for a forwarded log record.
    pub fn from_log(source: impl Into<String>, level: LogLevel, msg: String) -> Self {
        Self {
            id: source.into(),
            name: None,
            topic: None,
            msg,
            path: None,
            level: Some(level),
        }
    }
}
