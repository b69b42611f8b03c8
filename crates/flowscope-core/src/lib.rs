//! # flowscope-core
//!
//! Runtime value model and debug-node logic for the flowscope live
//! inspection facility.
//!
//! - [`FlowValue`]: shared, possibly-cyclic runtime value graphs
//! - [`format`]: bounded, cycle-safe display formatting
//! - [`FlowMessage`] / [`DebugEnvelope`]: inbound and wire shapes
//! - [`DebugNode`]: per-node emit/mirror behavior behind a [`DebugSink`]
//! - [`NodeRegistry`]: live node lookup for the control endpoint

#![deny(unsafe_code)]

pub mod format;
pub mod log;
pub mod msg;
pub mod node;
pub mod registry;
pub mod value;

pub use format::FormatError;
pub use log::{LogLevel, LogRecord};
pub use msg::{DebugEnvelope, FlowMessage};
pub use node::{DebugNode, DebugNodeConfig, DebugSink};
pub use registry::NodeRegistry;
pub use value::FlowValue;
