//! Viewer connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

/// One connected viewer.
///
/// Owned by the broadcaster's registry from add to remove; the send half
/// feeds the connection's writer task.
pub struct ViewerSession {
    /// Unique connection id.
    pub id: String,
    /// Send channel to the viewer's WebSocket write task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this viewer connected.
    pub connected_at: Instant,
    /// Messages dropped because the channel was full or closed.
    dropped_messages: AtomicU64,
}

impl ViewerSession {
    /// New session around a send channel.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            connected_at: Instant::now(),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a message without blocking.
    ///
    /// Returns `false` (and counts a drop) when the channel is full or
    /// closed. The session stays registered either way; only transport
    /// close/error removes it.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total messages dropped for this viewer.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// How long this viewer has been connected.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
