//! # flowscope-server
//!
//! Axum HTTP + `WebSocket` server pushing live debug events to viewers.
//!
//! - Viewer gateway: `GET <base>/debug/ws`, fan-out via [`ws::broadcast`]
//! - Control endpoint: `POST <base>/debug/{id}/{state}`
//! - Idle heartbeat pings so viewers can detect stalled connections
//! - Log bridge forwarding warn/error records from the runtime stream
//! - Graceful teardown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod log_bridge;
pub mod server;
pub mod shutdown;
pub mod ws;
