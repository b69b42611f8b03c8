//! Bounded display formatting for runtime values.
//!
//! Turns an arbitrary value graph (possibly cyclic, possibly huge) into
//! a finite, JSON-serializable display string. Containers are walked
//! depth-first with a visited set keyed by pointer identity; a repeated
//! reference renders as the `[circular]` marker instead of recursing.
//! Every rendered string is clipped to the configured display length.

use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::msg::FlowMessage;
use crate::value::FlowValue;

/// Marker substituted for a container seen earlier in the same walk.
pub const CIRCULAR: &str = "[circular]";

/// Placeholder for null / absent values.
pub const UNDEFINED: &str = "[undefined]";

/// Marker appended to clipped strings.
pub const TRUNCATED: &str = " ....";

/// Recursion ceiling for the serialization walk.
const MAX_DEPTH: usize = 64;

/// Formatting failure. Callers emitting debug output must treat this as
/// a per-message error, not a fatal one.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The value graph nests deeper than the display walk allows.
    #[error("value graph exceeds maximum display depth")]
    DepthExceeded,
    /// A container was write-locked while being formatted.
    #[error("value container is write-locked during formatting")]
    Contended,
}

/// Format a value for viewer display.
///
/// Non-primitive and non-string values carry a category tag
/// (`(Object) `, `(Array) `, `(boolean) `, `(Buffer) `); the tag counts
/// toward the length limit.
pub fn format_value(value: &FlowValue, max_len: usize) -> Result<String, FormatError> {
    let rendered = match value {
        FlowValue::Binary(bytes) => format!("(Buffer) {}", hex::encode(bytes)),
        FlowValue::Error { name, message } => format!("{name}: {message}"),
        FlowValue::Object(_) => format!("(Object) {}", write_json(value)?),
        FlowValue::Array(_) => format!("(Array) {}", write_json(value)?),
        FlowValue::Bool(b) => format!("(boolean) {b}"),
        // Checked before the generic number branch so 0 never falls into
        // a falsy short-circuit.
        FlowValue::Number(n) if *n == 0.0 => "0".to_owned(),
        FlowValue::Null => UNDEFINED.to_owned(),
        FlowValue::Text(s) => s.clone(),
        FlowValue::Number(n) => render_number(*n),
    };
    Ok(clip(rendered, max_len))
}

/// Format a whole message as a tagged object (`complete` debug mode).
pub fn format_message(msg: &FlowMessage, max_len: usize) -> Result<String, FormatError> {
    let mut w = Walker::new();
    w.write_message(msg)?;
    Ok(clip(format!("(Object) {}", w.out), max_len))
}

/// Render a value for console mirroring: no category tags, no clipping.
pub fn inspect(value: &FlowValue) -> Result<String, FormatError> {
    Ok(match value {
        FlowValue::Text(s) => s.clone(),
        FlowValue::Object(_) | FlowValue::Array(_) => write_json(value)?,
        FlowValue::Binary(bytes) => format!("(Buffer) {}", hex::encode(bytes)),
        FlowValue::Error { name, message } => format!("{name}: {message}"),
        FlowValue::Bool(b) => b.to_string(),
        FlowValue::Null => "null".to_owned(),
        FlowValue::Number(n) => render_number(*n),
    })
}

/// Render a whole message for console mirroring.
pub fn inspect_message(msg: &FlowMessage) -> Result<String, FormatError> {
    let mut w = Walker::new();
    w.write_message(msg)?;
    Ok(w.out)
}

/// Clip a rendered string to `max_len` characters, appending the
/// truncation marker when anything was cut.
pub fn clip(rendered: String, max_len: usize) -> String {
    if rendered.chars().count() > max_len {
        let mut clipped: String = rendered.chars().take(max_len).collect();
        clipped.push_str(TRUNCATED);
        clipped
    } else {
        rendered
    }
}

fn write_json(value: &FlowValue) -> Result<String, FormatError> {
    let mut w = Walker::new();
    w.write_value(value, 0)?;
    Ok(w.out)
}

/// Integral values render without a fractional part.
#[allow(clippy::cast_possible_truncation)]
fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Depth-first pretty-printer with one-space indentation and a visited
/// set over container identities.
struct Walker {
    out: String,
    seen: HashSet<usize>,
}

impl Walker {
    fn new() -> Self {
        Self {
            out: String::new(),
            seen: HashSet::new(),
        }
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push(' ');
        }
    }

    fn quoted(&mut self, s: &str) {
        self.out.push_str(&serde_json::Value::String(s.to_owned()).to_string());
    }

    fn write_message(&mut self, msg: &FlowMessage) -> Result<(), FormatError> {
        let mut fields: Vec<(&str, &FlowValue)> = Vec::new();
        let topic = msg.topic.clone().map(FlowValue::Text);
        let path = msg.path.clone().map(FlowValue::Text);
        if let Some(t) = &topic {
            fields.push(("topic", t));
        }
        if let Some(p) = &msg.payload {
            fields.push(("payload", p));
        }
        if let Some(p) = &path {
            fields.push(("_path", p));
        }

        if fields.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push_str("{\n");
        let last = fields.len() - 1;
        for (i, (key, value)) in fields.into_iter().enumerate() {
            self.indent(1);
            self.quoted(key);
            self.out.push_str(": ");
            self.write_value(value, 1)?;
            if i != last {
                self.out.push(',');
            }
            self.out.push('\n');
        }
        self.out.push('}');
        Ok(())
    }

    fn write_value(&mut self, value: &FlowValue, depth: usize) -> Result<(), FormatError> {
        if depth > MAX_DEPTH {
            return Err(FormatError::DepthExceeded);
        }
        match value {
            FlowValue::Null => self.out.push_str("null"),
            FlowValue::Bool(b) => {
                let _ = write!(self.out, "{b}");
            }
            FlowValue::Number(n) => {
                // Non-finite numbers have no JSON form.
                if n.is_finite() {
                    self.out.push_str(&render_number(*n));
                } else {
                    self.out.push_str("null");
                }
            }
            FlowValue::Text(s) => self.quoted(s),
            FlowValue::Binary(bytes) => {
                let rendered = format!("(Buffer) {}", hex::encode(bytes));
                self.quoted(&rendered);
            }
            FlowValue::Error { name, message } => {
                let rendered = format!("{name}: {message}");
                self.quoted(&rendered);
            }
            FlowValue::Array(items) => {
                let identity = std::sync::Arc::as_ptr(items) as usize;
                if !self.seen.insert(identity) {
                    self.quoted(CIRCULAR);
                    return Ok(());
                }
                let items = items.try_read().ok_or(FormatError::Contended)?;
                if items.is_empty() {
                    self.out.push_str("[]");
                    return Ok(());
                }
                self.out.push_str("[\n");
                let last = items.len() - 1;
                for (i, item) in items.iter().enumerate() {
                    self.indent(depth + 1);
                    self.write_value(item, depth + 1)?;
                    if i != last {
                        self.out.push(',');
                    }
                    self.out.push('\n');
                }
                self.indent(depth);
                self.out.push(']');
            }
            FlowValue::Object(map) => {
                let identity = std::sync::Arc::as_ptr(map) as usize;
                if !self.seen.insert(identity) {
                    self.quoted(CIRCULAR);
                    return Ok(());
                }
                let map = map.try_read().ok_or(FormatError::Contended)?;
                if map.is_empty() {
                    self.out.push_str("{}");
                    return Ok(());
                }
                self.out.push_str("{\n");
                let last = map.len() - 1;
                for (i, (key, item)) in map.iter().enumerate() {
                    self.indent(depth + 1);
                    self.quoted(key);
                    self.out.push_str(": ");
                    self.write_value(item, depth + 1)?;
                    if i != last {
                        self.out.push(',');
                    }
                    self.out.push('\n');
                }
                self.indent(depth);
                self.out.push('}');
            }
        }
        Ok(())
    }
}
