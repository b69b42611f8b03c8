//! Envelope fan-out to connected viewers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use flowscope_core::msg::DebugEnvelope;
use flowscope_core::node::DebugSink;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::connection::ViewerSession;

/// Session registry plus broadcast core.
///
/// One instance per hosting server, injected into the heartbeat timer
/// and every producer path. Mutation and iteration are mutually
/// exclusive, so add/remove during an in-flight fan-out can never
/// corrupt it. Sends are non-blocking: a slow or broken viewer is
/// counted and logged, never waited on, and never evicted here.
/// Removal is driven solely by transport close/error.
pub struct DebugBroadcaster {
    sessions: RwLock<HashMap<String, Arc<ViewerSession>>>,
    /// When the last fan-out (real or heartbeat) happened.
    last_sent: Mutex<Instant>,
}

impl DebugBroadcaster {
    /// Empty broadcaster.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            last_sent: Mutex::new(Instant::now()),
        }
    }

    /// Register a viewer after a successful handshake.
    pub fn add(&self, session: Arc<ViewerSession>) {
        let _ = self
            .sessions
            .write()
            .insert(session.id.clone(), session);
    }

    /// Deregister a viewer on close or error. Unknown ids are a no-op.
    pub fn remove(&self, id: &str) {
        let _ = self.sessions.write().remove(id);
    }

    /// Number of connected viewers.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Serialize an envelope once and fan it out to every viewer.
    pub fn broadcast(&self, envelope: &DebugEnvelope) {
        let json = match serde_json::to_string(envelope) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(node = %envelope.id, error = %e, "failed to serialize envelope");
                return;
            }
        };
        self.send_raw(json);
    }

    /// Fan out a pre-serialized payload (heartbeat path) and reset the
    /// idle clock.
    pub fn send_raw(&self, payload: Arc<String>) {
        {
            let sessions = self.sessions.read();
            let mut delivered = 0u32;
            for session in sessions.values() {
                if session.send(Arc::clone(&payload)) {
                    delivered += 1;
                } else {
                    warn!(
                        viewer = %session.id,
                        total_drops = session.drop_count(),
                        "failed to deliver debug event (channel full or closed)"
                    );
                }
            }
            debug!(viewers = sessions.len(), delivered, "broadcast event");
        }
        *self.last_sent.lock() = Instant::now();
    }

    /// Time since the last fan-out, for heartbeat suppression.
    pub fn idle_for(&self) -> Duration {
        self.last_sent.lock().elapsed()
    }
}

impl Default for DebugBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugSink for DebugBroadcaster {
    fn emit(&self, envelope: DebugEnvelope) {
        self.broadcast(&envelope);
    }
}
