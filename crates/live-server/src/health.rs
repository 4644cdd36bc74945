//! `/api/health` endpoint.

use std::time::Instant;

use chrono::Utc;
use live_core::events::format_timestamp;
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"OK"` while the server is answering.
    pub status: &'static str,
    /// Human-readable status line.
    pub message: &'static str,
    /// Time of the check.
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Open observer channels.
    pub connections: usize,
    /// Users inside the presence window.
    pub active_users: usize,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, connections: usize, active_users: usize) -> HealthResponse {
    HealthResponse {
        status: "OK",
        message: "Server is running",
        timestamp: format_timestamp(Utc::now()),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
        active_users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0, 0);
        assert_eq!(resp.status, "OK");
        assert_eq!(resp.message, "Server is running");
    }

    #[test]
    fn uptime_reflects_start_time() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        assert!(health_check(start, 0, 0).uptime_secs >= 59);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(health_check(Instant::now(), 3, 2)).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["connections"], 3);
        assert_eq!(json["activeUsers"], 2);
        assert!(json["uptimeSecs"].is_number());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
