//! Idle-connection liveness pings.
//!
//! One process-wide timer, not one per viewer: when no fan-out has
//! happened for longer than the period, every viewer gets a
//! `{"heartbeat": <epoch-millis>}` document. Real traffic keeps
//! resetting the idle clock, so a busy deployment never pings and an
//! idle one pings roughly every two periods.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::broadcast::DebugBroadcaster;

/// Run the heartbeat loop until cancelled.
///
/// Spawned once per server; the cancellation token ties it to the
/// hosting module's lifecycle so redeploys don't leak timers.
pub async fn run_heartbeat(
    broadcaster: Arc<DebugBroadcaster>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(period);
    // Skip the immediate first tick.
    let _ = ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if broadcaster.idle_for() > period {
                    let payload = heartbeat_payload(chrono::Utc::now().timestamp_millis());
                    broadcaster.send_raw(Arc::new(payload));
                    debug!("sent idle heartbeat");
                }
            }
            () = cancel.cancelled() => {
                debug!("heartbeat timer stopped");
                return;
            }
        }
    }
}

/// Minimal heartbeat document; bypasses envelope formatting.
pub fn heartbeat_payload(epoch_millis: i64) -> String {
    serde_json::json!({ "heartbeat": epoch_millis }).to_string()
}
