//! `/health` endpoint body.

use std::time::Instant;

use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server runs.
    pub status: String,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Connected viewer count.
    pub viewers: usize,
    /// Registered debug node count.
    pub nodes: usize,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, viewers: usize, nodes: usize) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        viewers,
        nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0, 0);
        assert_eq!(resp.status, "ok");
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn counters_pass_through() {
        let resp = health_check(Instant::now(), 4, 2);
        assert_eq!(resp.viewers, 4);
        assert_eq!(resp.nodes, 2);
    }

    #[test]
    fn uptime_reflects_start() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(90))
            .unwrap();
        let resp = health_check(start, 0, 0);
        assert!(resp.uptime_secs >= 89);
    }

    #[test]
    fn serializes_all_fields() {
        let resp = health_check(Instant::now(), 1, 1);
        let v: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(v["status"], "ok");
        assert!(v["uptime_secs"].is_number());
        assert_eq!(v["viewers"], 1);
        assert_eq!(v["nodes"], 1);
    }
}
