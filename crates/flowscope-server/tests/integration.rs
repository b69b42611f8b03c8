//! End-to-end tests driving a real bound server with a WebSocket viewer.

use std::sync::Arc;
use std::time::Duration;

use flowscope_core::log::{LogLevel, LogRecord};
use flowscope_core::msg::FlowMessage;
use flowscope_core::node::{DebugNode, DebugNodeConfig};
use flowscope_core::registry::NodeRegistry;
use flowscope_core::value::FlowValue;
use futures::StreamExt;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use flowscope_server::config::ScopeConfig;
use flowscope_server::log_bridge::LogBridge;
use flowscope_server::server::ScopeServer;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Boot a server with one registered debug node and return the ws/http
/// URLs plus the live handles.
async fn boot(config: ScopeConfig) -> (String, String, Arc<NodeRegistry>, ScopeServer) {
    let nodes = Arc::new(NodeRegistry::new());
    nodes.register(Arc::new(DebugNode::new(
        "n1",
        DebugNodeConfig::default(),
        config.max_msg_length,
    )));

    let server = ScopeServer::new(config, nodes.clone());
    let (addr, _handle) = server.listen().await.unwrap();
    let ws_url = format!("ws://{addr}/debug/ws");
    let http_url = format!("http://{addr}");
    (ws_url, http_url, nodes, server)
}

async fn connect(ws_url: &str) -> WsStream {
    let (stream, _) = connect_async(ws_url).await.expect("viewer connects");
    // Give the server a beat to register the session.
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream
}

async fn next_json(stream: &mut WsStream) -> serde_json::Value {
    loop {
        let frame = timeout(TIMEOUT, stream.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("frame ok");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("valid JSON");
        }
    }
}

#[tokio::test]
async fn viewer_receives_node_output() {
    let (ws_url, _http, nodes, server) = boot(ScopeConfig::default()).await;
    let mut viewer = connect(&ws_url).await;

    let node = nodes.get("n1").unwrap();
    node.handle(
        &FlowMessage::new(FlowValue::Bool(true)).with_topic("sensors"),
        server.broadcast().as_ref(),
    );

    let event = next_json(&mut viewer).await;
    assert_eq!(event["id"], "n1");
    assert_eq!(event["topic"], "sensors");
    assert_eq!(event["msg"], "(boolean) true");
    server.shutdown().shutdown();
}

#[tokio::test]
async fn all_viewers_receive_each_event() {
    let (ws_url, _http, nodes, server) = boot(ScopeConfig::default()).await;
    let mut viewer_a = connect(&ws_url).await;
    let mut viewer_b = connect(&ws_url).await;

    let node = nodes.get("n1").unwrap();
    node.handle(
        &FlowMessage::new(FlowValue::from("shared")),
        server.broadcast().as_ref(),
    );

    assert_eq!(next_json(&mut viewer_a).await["msg"], "shared");
    assert_eq!(next_json(&mut viewer_b).await["msg"], "shared");
    server.shutdown().shutdown();
}

#[tokio::test]
async fn admin_endpoint_status_codes() {
    let (_ws, http, nodes, server) = boot(ScopeConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{http}/debug/n1/disable"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    assert!(!nodes.get("n1").unwrap().is_active());

    let resp = client
        .post(format!("{http}/debug/n1/enable"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(nodes.get("n1").unwrap().is_active());

    let resp = client
        .post(format!("{http}/debug/n1/bogus"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = client
        .post(format!("{http}/debug/ghost/disable"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    server.shutdown().shutdown();
}

#[tokio::test]
async fn disabled_node_goes_quiet_until_reenabled() {
    let (ws_url, http, nodes, server) = boot(ScopeConfig::default()).await;
    let mut viewer = connect(&ws_url).await;
    let client = reqwest::Client::new();
    let node = nodes.get("n1").unwrap();

    let resp = client
        .post(format!("{http}/debug/n1/disable"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    node.handle(
        &FlowMessage::new(FlowValue::from("silenced")),
        server.broadcast().as_ref(),
    );
    let quiet = timeout(Duration::from_millis(300), viewer.next()).await;
    assert!(quiet.is_err(), "no event while disabled");

    let resp = client
        .post(format!("{http}/debug/n1/enable"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    node.handle(
        &FlowMessage::new(FlowValue::from("back")),
        server.broadcast().as_ref(),
    );
    assert_eq!(next_json(&mut viewer).await["msg"], "back");
    server.shutdown().shutdown();
}

#[tokio::test]
async fn idle_viewer_gets_heartbeat() {
    let config = ScopeConfig {
        heartbeat_secs: 1,
        ..ScopeConfig::default()
    };
    let (ws_url, _http, _nodes, server) = boot(config).await;
    let mut viewer = connect(&ws_url).await;

    let event = next_json(&mut viewer).await;
    assert!(event["heartbeat"].is_number(), "got: {event}");
    server.shutdown().shutdown();
}

#[tokio::test]
async fn log_bridge_forwards_only_warn_and_error() {
    let (ws_url, _http, _nodes, server) = boot(ScopeConfig::default()).await;
    let mut viewer = connect(&ws_url).await;

    let (log_tx, log_rx) = tokio::sync::broadcast::channel(16);
    let bridge = LogBridge::new(log_rx, server.broadcast().clone(), 1000);
    let bridge_task = tokio::spawn(bridge.run());

    let _ = log_tx
        .send(LogRecord::new(LogLevel::Info, "routine"))
        .unwrap();
    let _ = log_tx
        .send(LogRecord::new(LogLevel::Warn, "watch out").with_source("n1"))
        .unwrap();

    let event = next_json(&mut viewer).await;
    assert_eq!(event["level"], "warn");
    assert_eq!(event["msg"], "watch out");
    assert_eq!(event["id"], "n1");

    drop(log_tx);
    let _ = bridge_task.await;
    server.shutdown().shutdown();
}

#[tokio::test]
async fn closing_viewer_deregisters_session() {
    let (ws_url, _http, _nodes, server) = boot(ScopeConfig::default()).await;
    let mut viewer = connect(&ws_url).await;
    assert_eq!(server.broadcast().session_count(), 1);

    viewer.close(None).await.unwrap();

    let mut remaining = server.broadcast().session_count();
    for _ in 0..50 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = server.broadcast().session_count();
    }
    assert_eq!(remaining, 0, "session removed after close");
    server.shutdown().shutdown();
}

#[tokio::test]
async fn shutdown_stops_serving() {
    let nodes = Arc::new(NodeRegistry::new());
    let server = ScopeServer::new(ScopeConfig::default(), nodes);
    let (_addr, handle) = server.listen().await.unwrap();

    server.shutdown().shutdown();
    timeout(TIMEOUT, handle)
        .await
        .expect("server task exits after shutdown")
        .unwrap();
}

#[tokio::test]
async fn complete_mode_envelope_over_the_wire() {
    let config = ScopeConfig::default();
    let nodes = Arc::new(NodeRegistry::new());
    nodes.register(Arc::new(DebugNode::new(
        "n2",
        DebugNodeConfig {
            complete: true,
            ..DebugNodeConfig::default()
        },
        config.max_msg_length,
    )));
    let server = ScopeServer::new(config, nodes.clone());
    let (addr, _handle) = server.listen().await.unwrap();
    let mut viewer = connect(&format!("ws://{addr}/debug/ws")).await;

    nodes.get("n2").unwrap().handle(
        &FlowMessage::new(FlowValue::from(7)).with_topic("t").with_path("f/n2"),
        server.broadcast().as_ref(),
    );

    let event = next_json(&mut viewer).await;
    assert_eq!(event["id"], "n2");
    assert_eq!(event["_path"], "f/n2");
    let msg = event["msg"].as_str().unwrap();
    assert!(msg.starts_with("(Object) {"));
    assert!(msg.contains("\"payload\": 7"));
    server.shutdown().shutdown();
}
