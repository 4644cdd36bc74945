//! Network, WebSocket and CORS settings.

use serde::{Deserialize, Serialize};

/// Longest accepted ping interval (one hour).
pub const MAX_HEARTBEAT_INTERVAL_SECS: u64 = 3_600;

/// HTTP and WebSocket listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Path the observer channel is upgraded on.
    pub ws_path: String,
    /// Maximum concurrently open observer channels.
    pub max_connections: usize,
    /// Seconds between server pings on each channel.
    pub heartbeat_interval_secs: u64,
    /// Seconds of silence after which a channel is closed.
    pub heartbeat_timeout_secs: u64,
    /// Largest inbound frame accepted, in bytes.
    pub max_message_size: usize,
    /// Outbound frames buffered per channel before new frames are dropped.
    pub send_queue_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            ws_path: "/ws".to_string(),
            max_connections: 50,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 64 * 1024,
            send_queue_capacity: 256,
        }
    }
}

/// Cross-origin settings for the HTTP routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsSettings {
    /// Origins allowed to call the API. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}
