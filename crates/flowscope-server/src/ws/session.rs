//! Viewer connection lifecycle — from upgrade through disconnect.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::server::AppState;

use super::broadcast::DebugBroadcaster;
use super::connection::ViewerSession;

/// `GET <base>/debug/ws` — upgrade and run a viewer session.
pub async fn viewer_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let viewer_id = format!("viewer_{}", Uuid::now_v7());
    let broadcast = state.broadcast.clone();
    let buffer = state.config.send_buffer;
    ws.on_upgrade(move |socket| run_viewer_session(socket, viewer_id, broadcast, buffer))
}

/// Drive one connected viewer.
///
/// Registers the session, pumps queued broadcasts into the socket, and
/// reads until the viewer closes or the transport errors. Viewers are
/// receive-only; inbound frames other than close are ignored. Both exit
/// paths deregister the session.
#[instrument(skip_all, fields(viewer_id = %viewer_id))]
pub async fn run_viewer_session(
    ws: WebSocket,
    viewer_id: String,
    broadcast: Arc<DebugBroadcaster>,
    buffer: usize,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (tx, mut rx) = mpsc::channel::<Arc<String>>(buffer);
    let session = Arc::new(ViewerSession::new(viewer_id.clone(), tx));

    info!("viewer connected");
    broadcast.add(session.clone());

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_tx
                .send(Message::Text(text.as_str().to_owned().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Close(_)) => {
                info!("viewer sent close frame");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "viewer connection error");
                break;
            }
        }
    }

    broadcast.remove(&viewer_id);
    writer.abort();
    info!(age_secs = session.age().as_secs(), "viewer disconnected");
}
