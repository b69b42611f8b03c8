//! Dynamic runtime value graph carried by flow messages.
//!
//! Containers are shared (`Arc` + `RwLock`), so the same object or array
//! can appear in several places of a message, including inside itself.
//! The formatter relies on pointer identity of the shared containers to
//! detect such repeats.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared object container.
pub type ObjectRef = Arc<RwLock<BTreeMap<String, FlowValue>>>;

/// Shared array container.
pub type ArrayRef = Arc<RwLock<Vec<FlowValue>>>;

/// A value flowing through the engine.
///
/// This is the tagged union the formatter dispatches on: one variant per
/// displayable value kind.
#[derive(Clone, Debug)]
pub enum FlowValue {
    /// JSON null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw byte buffer.
    Binary(Vec<u8>),
    /// Shared array; `clone` aliases the same storage.
    Array(ArrayRef),
    /// Shared object; `clone` aliases the same storage.
    Object(ObjectRef),
    /// Error-like runtime value.
    Error {
        /// Error class name (e.g. `"Error"`, `"TypeError"`).
        name: String,
        /// Human-readable description.
        message: String,
    },
}

impl FlowValue {
    /// New empty shared object.
    pub fn object() -> Self {
        FlowValue::Object(Arc::new(RwLock::new(BTreeMap::new())))
    }

    /// New shared object from key/value pairs.
    pub fn object_from<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, FlowValue)>,
    {
        FlowValue::Object(Arc::new(RwLock::new(entries.into_iter().collect())))
    }

    /// New empty shared array.
    pub fn array() -> Self {
        FlowValue::Array(Arc::new(RwLock::new(Vec::new())))
    }

    /// New shared array from elements.
    pub fn array_from<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = FlowValue>,
    {
        FlowValue::Array(Arc::new(RwLock::new(elements.into_iter().collect())))
    }

    /// Generic error value with the default `"Error"` class name.
    pub fn error(message: impl Into<String>) -> Self {
        FlowValue::Error {
            name: "Error".into(),
            message: message.into(),
        }
    }

    /// Insert into an object value. No-op on other variants.
    pub fn insert(&self, key: impl Into<String>, value: FlowValue) {
        if let FlowValue::Object(map) = self {
            let _ = map.write().insert(key.into(), value);
        }
    }

    /// Append to an array value. No-op on other variants.
    pub fn push(&self, value: FlowValue) {
        if let FlowValue::Array(items) = self {
            items.write().push(value);
        }
    }

    /// Convert a `serde_json::Value` tree into a (fresh, unaliased) value
    /// graph. Used when payloads arrive over a wire rather than from the
    /// engine directly.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FlowValue::Null,
            serde_json::Value::Bool(b) => FlowValue::Bool(b),
            serde_json::Value::Number(n) => FlowValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => FlowValue::Text(s),
            serde_json::Value::Array(items) => {
                FlowValue::array_from(items.into_iter().map(FlowValue::from_json))
            }
            serde_json::Value::Object(map) => FlowValue::object_from(
                map.into_iter().map(|(k, v)| (k, FlowValue::from_json(v))),
            ),
        }
    }
}

impl From<&str> for FlowValue {
    fn from(s: &str) -> Self {
        FlowValue::Text(s.to_owned())
    }
}

impl From<String> for FlowValue {
    fn from(s: String) -> Self {
        FlowValue::Text(s)
    }
}

impl From<f64> for FlowValue {
    fn from(n: f64) -> Self {
        FlowValue::Number(n)
    }
}

impl From<i64> for FlowValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        FlowValue::Number(n as f64)
    }
}

impl From<bool> for FlowValue {
    fn from(b: bool) -> Self {
        FlowValue::Bool(b)
    }
}

impl From<Vec<u8>> for FlowValue {
    fn from(bytes: Vec<u8>) -> Self {
        FlowValue::Binary(bytes)
    }
}
