//! Server configuration.

use std::time::Duration;

use live_settings::{LiveSettings, MAX_HEARTBEAT_INTERVAL_SECS, MAX_SWEEP_INTERVAL_SECS};
use serde::{Deserialize, Serialize};

use crate::errors::LiveError;

/// Paths owned by the HTTP routes; the channel path may not shadow them.
const RESERVED_PATHS: &[&str] = &[
    "/api/health",
    "/api/analytics/track",
    "/api/analytics/events",
    "/api/analytics/active-users",
    "/metrics",
];

/// Configuration for the live-activity server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Path the observer channel is upgraded on.
    pub ws_path: String,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Close a channel after this many seconds without a pong.
    pub heartbeat_timeout_secs: u64,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Outbound frames buffered per channel.
    pub send_queue_capacity: usize,
    /// Trailing presence window in seconds.
    pub presence_window_secs: u64,
    /// Seconds between presence sweeps.
    pub presence_sweep_secs: u64,
    /// CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Build from layered settings.
    pub fn from_settings(settings: &LiveSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            ws_path: settings.server.ws_path.clone(),
            max_connections: settings.server.max_connections,
            heartbeat_interval_secs: settings.server.heartbeat_interval_secs,
            heartbeat_timeout_secs: settings.server.heartbeat_timeout_secs,
            max_message_size: settings.server.max_message_size,
            send_queue_capacity: settings.server.send_queue_capacity,
            presence_window_secs: settings.presence.window_secs,
            presence_sweep_secs: settings.presence.sweep_interval_secs,
            allowed_origins: settings.cors.allowed_origins.clone(),
        }
    }

    /// Reject values the router, session timers or sweep task cannot run with.
    ///
    /// The presence window is checked by [`crate::presence::PresenceTracker::new`].
    pub fn validate(&self) -> Result<(), LiveError> {
        if !self.ws_path.starts_with('/') {
            return Err(invalid(format!("ws_path must start with '/', got {:?}", self.ws_path)));
        }
        if RESERVED_PATHS.contains(&self.ws_path.as_str()) {
            return Err(invalid(format!("ws_path {:?} is already routed", self.ws_path)));
        }
        if self.heartbeat_interval_secs == 0
            || self.heartbeat_interval_secs > MAX_HEARTBEAT_INTERVAL_SECS
        {
            return Err(invalid(format!(
                "heartbeat_interval_secs must be in 1..={MAX_HEARTBEAT_INTERVAL_SECS}, got {}",
                self.heartbeat_interval_secs
            )));
        }
        if self.heartbeat_timeout_secs < self.heartbeat_interval_secs {
            return Err(invalid(format!(
                "heartbeat_timeout_secs ({}) must be >= heartbeat_interval_secs ({})",
                self.heartbeat_timeout_secs, self.heartbeat_interval_secs
            )));
        }
        if self.presence_sweep_secs == 0 || self.presence_sweep_secs > MAX_SWEEP_INTERVAL_SECS {
            return Err(invalid(format!(
                "presence_sweep_secs must be in 1..={MAX_SWEEP_INTERVAL_SECS}, got {}",
                self.presence_sweep_secs
            )));
        }
        if self.send_queue_capacity == 0 {
            return Err(invalid("send_queue_capacity must be > 0".into()));
        }
        Ok(())
    }

    /// Heartbeat interval as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Heartbeat timeout as a [`Duration`].
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    /// Presence window as a [`Duration`].
    pub fn presence_window(&self) -> Duration {
        Duration::from_secs(self.presence_window_secs)
    }

    /// Presence sweep interval as a [`Duration`].
    pub fn presence_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.presence_sweep_secs)
    }
}

fn invalid(reason: String) -> LiveError {
    LiveError::InvalidConfig(reason)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            ws_path: "/ws".into(),
            max_connections: 50,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 64 * 1024,
            send_queue_capacity: 256,
            presence_window_secs: 300,
            presence_sweep_secs: 60,
            allowed_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_on_ephemeral_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_presence_window_is_five_minutes() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.presence_window(), Duration::from_secs(300));
    }

    #[test]
    fn default_durations() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(cfg.heartbeat_timeout(), Duration::from_secs(90));
        assert_eq!(cfg.presence_sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn default_is_valid() {
        assert_eq!(ServerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_settings_convert_to_valid_config() {
        let cfg = ServerConfig::from_settings(&LiveSettings::default());
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn zero_heartbeat_interval_rejected() {
        let cfg = ServerConfig {
            heartbeat_interval_secs: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(LiveError::InvalidConfig(msg)) if msg.contains("heartbeat_interval_secs")));
    }

    #[test]
    fn oversized_heartbeat_interval_rejected() {
        let cfg = ServerConfig {
            heartbeat_interval_secs: u64::MAX,
            heartbeat_timeout_secs: u64::MAX,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn heartbeat_timeout_below_interval_rejected() {
        let cfg = ServerConfig {
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 5,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sweep_interval_bounds() {
        for secs in [0, u64::MAX] {
            let cfg = ServerConfig {
                presence_sweep_secs: secs,
                ..ServerConfig::default()
            };
            assert!(cfg.validate().is_err(), "sweep {secs} accepted");
        }
    }

    #[test]
    fn ws_path_must_be_absolute_and_free() {
        for path in ["ws", "/api/health", "/metrics"] {
            let cfg = ServerConfig {
                ws_path: path.into(),
                ..ServerConfig::default()
            };
            assert!(cfg.validate().is_err(), "{path} accepted");
        }
    }

    #[test]
    fn zero_send_queue_rejected() {
        let cfg = ServerConfig {
            send_queue_capacity: 0,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn from_settings_copies_every_section() {
        let mut settings = LiveSettings::default();
        settings.server.port = 5050;
        settings.server.ws_path = "/live".into();
        settings.presence.window_secs = 120;
        settings.cors.allowed_origins = vec!["https://admin.example.com".into()];

        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 5050);
        assert_eq!(cfg.ws_path, "/live");
        assert_eq!(cfg.presence_window_secs, 120);
        assert_eq!(cfg.send_queue_capacity, 256);
        assert_eq!(cfg.allowed_origins, vec!["https://admin.example.com"]);
    }
}
