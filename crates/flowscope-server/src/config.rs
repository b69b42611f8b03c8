//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the debug server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Path prefix for the viewer and admin endpoints (default `"/"`).
    pub base_path: String,
    /// Maximum display length for formatted values.
    pub max_msg_length: usize,
    /// Idle heartbeat period in seconds.
    pub heartbeat_secs: u64,
    /// Per-viewer outbound channel capacity.
    pub send_buffer: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            base_path: "/".into(),
            max_msg_length: 1000,
            heartbeat_secs: 15,
            send_buffer: 1024,
        }
    }
}

impl ScopeConfig {
    /// Defaults plus `FLOWSCOPE_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        apply_overrides(&mut config, |name| std::env::var(name).ok());
        config
    }
}

/// Apply environment-style overrides from a lookup function.
///
/// Parsing is strict: values that fail to parse or fall outside their
/// range are silently ignored, keeping the previous setting.
pub fn apply_overrides<F>(config: &mut ScopeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("FLOWSCOPE_HOST") {
        if !v.is_empty() {
            config.host = v;
        }
    }
    if let Some(v) = parse_in_range(lookup("FLOWSCOPE_PORT"), 0, 65535) {
        #[allow(clippy::cast_possible_truncation)]
        {
            config.port = v as u16;
        }
    }
    if let Some(v) = lookup("FLOWSCOPE_BASE_PATH") {
        if v.starts_with('/') {
            config.base_path = v;
        }
    }
    if let Some(v) = parse_in_range(lookup("FLOWSCOPE_MAX_MSG_LENGTH"), 1, 1_000_000) {
        #[allow(clippy::cast_possible_truncation)]
        {
            config.max_msg_length = v as usize;
        }
    }
    if let Some(v) = parse_in_range(lookup("FLOWSCOPE_HEARTBEAT_SECS"), 1, 3600) {
        config.heartbeat_secs = v;
    }
    if let Some(v) = parse_in_range(lookup("FLOWSCOPE_SEND_BUFFER"), 1, 65536) {
        #[allow(clippy::cast_possible_truncation)]
        {
            config.send_buffer = v as usize;
        }
    }
}

fn parse_in_range(value: Option<String>, min: u64, max: u64) -> Option<u64> {
    let parsed: u64 = value?.trim().parse().ok()?;
    (min..=max).contains(&parsed).then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ScopeConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.base_path, "/");
        assert_eq!(cfg.max_msg_length, 1000);
        assert_eq!(cfg.heartbeat_secs, 15);
        assert_eq!(cfg.send_buffer, 1024);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ScopeConfig::default();
        let back: ScopeConfig =
            serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.max_msg_length, cfg.max_msg_length);
        assert_eq!(back.heartbeat_secs, cfg.heartbeat_secs);
    }

    #[test]
    fn overrides_apply() {
        let mut cfg = ScopeConfig::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("FLOWSCOPE_HOST", "0.0.0.0"),
                ("FLOWSCOPE_PORT", "1880"),
                ("FLOWSCOPE_BASE_PATH", "/admin"),
                ("FLOWSCOPE_MAX_MSG_LENGTH", "500"),
                ("FLOWSCOPE_HEARTBEAT_SECS", "30"),
            ]),
        );
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 1880);
        assert_eq!(cfg.base_path, "/admin");
        assert_eq!(cfg.max_msg_length, 500);
        assert_eq!(cfg.heartbeat_secs, 30);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut cfg = ScopeConfig::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("FLOWSCOPE_PORT", "not-a-port"),
                ("FLOWSCOPE_MAX_MSG_LENGTH", "0"),
                ("FLOWSCOPE_HEARTBEAT_SECS", "999999"),
                ("FLOWSCOPE_BASE_PATH", "missing-slash"),
            ]),
        );
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.max_msg_length, 1000);
        assert_eq!(cfg.heartbeat_secs, 15);
        assert_eq!(cfg.base_path, "/");
    }

    #[test]
    fn absent_vars_keep_defaults() {
        let mut cfg = ScopeConfig::default();
        apply_overrides(&mut cfg, |_| None);
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[test]
    fn whitespace_is_trimmed_for_numbers() {
        let mut cfg = ScopeConfig::default();
        apply_overrides(&mut cfg, env(&[("FLOWSCOPE_HEARTBEAT_SECS", " 20 ")]));
        assert_eq!(cfg.heartbeat_secs, 20);
    }
}
