//! Per-node debug behavior.
//!
//! A debug node runs in one of two modes fixed at deploy time: `complete`
//! emits the whole incoming message, otherwise only the payload is
//! emitted. The `active` flag gates emission at runtime and is the only
//! mutable piece of node state; console mirroring is independent of it.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::format::{self, UNDEFINED};
use crate::msg::{DebugEnvelope, FlowMessage};
use crate::value::FlowValue;

/// Receives finished envelopes for fan-out. Implemented by the server's
/// broadcaster; kept as a trait so node logic is testable without one.
pub trait DebugSink {
    /// Hand over one envelope for delivery.
    fn emit(&self, envelope: DebugEnvelope);
}

/// Deploy-time node settings.
///
/// The flow editor serializes `complete` and `console` as the strings
/// `"true"`/`"false"`; both spellings are accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugNodeConfig {
    /// Display name shown to viewers.
    #[serde(default)]
    pub name: Option<String>,
    /// Emit output when handling input. Defaults to on.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Emit the whole message instead of just the payload.
    #[serde(default, deserialize_with = "flag")]
    pub complete: bool,
    /// Additionally mirror output to the runtime log.
    #[serde(default, deserialize_with = "flag")]
    pub console: bool,
}

impl Default for DebugNodeConfig {
    fn default() -> Self {
        Self {
            name: None,
            active: true,
            complete: false,
            console: false,
        }
    }
}

fn default_active() -> bool {
    true
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => Ok(s == "true"),
    }
}

/// A live debug node instance.
pub struct DebugNode {
    id: String,
    name: Option<String>,
    complete: bool,
    console: bool,
    active: AtomicBool,
    max_msg_length: usize,
}

impl DebugNode {
    /// Instantiate a node from its deploy-time config.
    pub fn new(id: impl Into<String>, config: DebugNodeConfig, max_msg_length: usize) -> Self {
        Self {
            id: id.into(),
            name: config.name,
            complete: config.complete,
            console: config.console,
            active: AtomicBool::new(config.active),
            max_msg_length,
        }
    }

    /// Node identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current emission state.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Toggle emission (control endpoint).
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// Process one incoming message.
    ///
    /// Formatting failures are logged and swallowed here so one bad
    /// message never takes down the producing task.
    pub fn handle(&self, msg: &FlowMessage, sink: &dyn DebugSink) {
        if self.console {
            self.mirror(msg);
        }

        if self.complete {
            let normalized = normalize_complete(msg);
            if self.is_active() {
                match format::format_message(&normalized, self.max_msg_length) {
                    Ok(text) => sink.emit(DebugEnvelope::from_node(
                        &self.id,
                        self.name.clone(),
                        msg.topic.clone(),
                        text,
                        msg.path.clone(),
                    )),
                    Err(e) => {
                        warn!(node = %self.id, error = %e, "dropping unformattable message");
                    }
                }
            }
        } else {
            let payload = normalize_payload(msg.payload.as_ref());
            if self.is_active() {
                match format::format_value(&payload, self.max_msg_length) {
                    Ok(text) => sink.emit(DebugEnvelope::from_node(
                        &self.id,
                        self.name.clone(),
                        msg.topic.clone(),
                        text,
                        msg.path.clone(),
                    )),
                    Err(e) => {
                        warn!(node = %self.id, error = %e, "dropping unformattable payload");
                    }
                }
            }
        }
    }

    /// Write the message to the runtime's own log.
    ///
    /// Payload-only mode newline-prefixes only multi-line strings and
    /// container inspections; complete mode always newline-prefixes.
    /// The asymmetry is deliberate.
    fn mirror(&self, msg: &FlowMessage) {
        if self.complete {
            match format::inspect_message(msg) {
                Ok(text) => info!(node = %self.id, "\n{}", text),
                Err(e) => warn!(node = %self.id, error = %e, "cannot mirror message"),
            }
            return;
        }
        match msg.payload.as_ref() {
            Some(FlowValue::Text(s)) => {
                if s.contains('\n') {
                    info!(node = %self.id, "\n{}", s);
                } else {
                    info!(node = %self.id, "{}", s);
                }
            }
            Some(v @ (FlowValue::Object(_) | FlowValue::Array(_))) => {
                match format::inspect(v) {
                    Ok(text) => info!(node = %self.id, "\n{}", text),
                    Err(e) => warn!(node = %self.id, error = %e, "cannot mirror payload"),
                }
            }
            other => {
                let value = other.cloned().unwrap_or(FlowValue::Null);
                match format::inspect(&value) {
                    Ok(text) => info!(node = %self.id, "{}", text),
                    Err(e) => warn!(node = %self.id, error = %e, "cannot mirror payload"),
                }
            }
        }
    }
}

/// Complete-mode normalization: a binary payload is rendered up front.
fn normalize_complete(msg: &FlowMessage) -> FlowMessage {
    let mut normalized = msg.clone();
    if let Some(FlowValue::Binary(bytes)) = &normalized.payload {
        normalized.payload = Some(FlowValue::Text(format!("(Buffer) {}", hex::encode(bytes))));
    }
    normalized
}

/// Payload-only normalization: binary becomes text immediately and an
/// absent payload becomes the placeholder.
fn normalize_payload(payload: Option<&FlowValue>) -> FlowValue {
    match payload {
        None => FlowValue::Text(UNDEFINED.to_owned()),
        Some(FlowValue::Binary(bytes)) => {
            FlowValue::Text(format!("(Buffer) {}", hex::encode(bytes)))
        }
        Some(v) => v.clone(),
    }
}
