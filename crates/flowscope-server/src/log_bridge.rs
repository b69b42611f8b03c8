//! Runtime log stream → viewer broadcast.
//!
//! Forwards `warn` and `error` records through the same broadcaster the
//! debug nodes use, tagged with their severity so viewers can tell them
//! apart from flow output. Everything below `warn` is dropped here.

use std::sync::Arc;

use flowscope_core::format;
use flowscope_core::log::LogRecord;
use flowscope_core::msg::DebugEnvelope;
use tokio::sync::broadcast;

use crate::ws::broadcast::DebugBroadcaster;

/// Fallback envelope id for records with no node source.
const RUNTIME_SOURCE: &str = "runtime";

/// Bridges the runtime's log stream to connected viewers.
pub struct LogBridge {
    rx: broadcast::Receiver<LogRecord>,
    broadcast: Arc<DebugBroadcaster>,
    max_msg_length: usize,
}

impl LogBridge {
    /// New bridge over a log stream subscription.
    pub fn new(
        rx: broadcast::Receiver<LogRecord>,
        broadcast: Arc<DebugBroadcaster>,
        max_msg_length: usize,
    ) -> Self {
        Self {
            rx,
            broadcast,
            max_msg_length,
        }
    }

    /// Run the bridge loop. Exits when the log sender is dropped.
    #[tracing::instrument(skip_all, name = "log_bridge")]
    pub async fn run(mut self) {
        loop {
            match self.rx.recv().await {
                Ok(record) => {
                    if record.level.is_broadcast() {
                        let envelope = log_to_envelope(&record, self.max_msg_length);
                        self.broadcast.broadcast(&envelope);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "log bridge lagged, records skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("log stream closed, bridge exiting");
                    break;
                }
            }
        }
    }
}

/// Convert a log record into a level-tagged envelope, clipped to the
/// configured display length.
pub fn log_to_envelope(record: &LogRecord, max_msg_length: usize) -> DebugEnvelope {
    let source = record
        .source
        .clone()
        .unwrap_or_else(|| RUNTIME_SOURCE.to_owned());
    DebugEnvelope::from_log(
        source,
        record.level,
        format::clip(record.text.clone(), max_msg_length),
    )
}
