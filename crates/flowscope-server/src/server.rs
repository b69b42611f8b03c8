//! `ScopeServer` — axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use flowscope_core::registry::NodeRegistry;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ScopeConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::ws::broadcast::DebugBroadcaster;
use crate::ws::heartbeat::run_heartbeat;
use crate::ws::session::viewer_ws;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Viewer fan-out.
    pub broadcast: Arc<DebugBroadcaster>,
    /// Live debug nodes.
    pub nodes: Arc<NodeRegistry>,
    /// Teardown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server start time.
    pub start_time: Instant,
    /// Effective configuration.
    pub config: Arc<ScopeConfig>,
}

/// The debug server: viewer endpoint, control endpoint, health.
pub struct ScopeServer {
    config: Arc<ScopeConfig>,
    nodes: Arc<NodeRegistry>,
    broadcast: Arc<DebugBroadcaster>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl ScopeServer {
    /// Create a server around the engine's node registry.
    pub fn new(config: ScopeConfig, nodes: Arc<NodeRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            nodes,
            broadcast: Arc::new(DebugBroadcaster::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            broadcast: self.broadcast.clone(),
            nodes: self.nodes.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            config: self.config.clone(),
        };

        let base = &self.config.base_path;
        Router::new()
            .route(&route_path(base, "debug/ws"), get(viewer_ws))
            .route(&route_path(base, "debug/{id}/{state}"), post(set_node_state))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve; also starts the heartbeat timer.
    ///
    /// Returns the bound address (useful with port 0) and the serve
    /// task handle. Both the server and the heartbeat stop when the
    /// shutdown coordinator fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
                .await?;
        let addr = listener.local_addr()?;

        let _ = tokio::spawn(run_heartbeat(
            self.broadcast.clone(),
            Duration::from_secs(self.config.heartbeat_secs),
            self.shutdown.token(),
        ));

        let app = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "debug server failed");
            }
        });

        info!(%addr, base = %self.config.base_path, "debug server listening");
        Ok((addr, handle))
    }

    /// The broadcaster, for wiring producers and bridges.
    pub fn broadcast(&self) -> &Arc<DebugBroadcaster> {
        &self.broadcast
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The node registry handle.
    pub fn nodes(&self) -> &Arc<NodeRegistry> {
        &self.nodes
    }

    /// Effective configuration.
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }
}

/// Join the configured base path with an endpoint suffix.
fn route_path(base: &str, suffix: &str) -> String {
    let mut path = if base.starts_with('/') {
        base.to_owned()
    } else {
        format!("/{base}")
    };
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(suffix);
    path
}

/// `POST <base>/debug/{id}/{state}` — toggle a node's active flag.
///
/// 200 on enable, 201 on disable, 404 for an unknown node or any other
/// state token. No state changes on failure.
async fn set_node_state(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> StatusCode {
    let Some(node) = state.nodes.get(&id) else {
        debug!(id, action, "state change for unknown node");
        return StatusCode::NOT_FOUND;
    };
    match action.as_str() {
        "enable" => {
            node.set_active(true);
            info!(id, "debug node enabled");
            StatusCode::OK
        }
        "disable" => {
            node.set_active(false);
            info!(id, "debug node disabled");
            StatusCode::CREATED
        }
        _ => {
            debug!(id, action, "unknown state token");
            StatusCode::NOT_FOUND
        }
    }
}

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.broadcast.session_count(),
        state.nodes.len(),
    );
    Json(resp)
}
