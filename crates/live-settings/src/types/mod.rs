//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a settings file only needs the keys it changes.

mod logging;
mod presence;
mod server;

pub use logging::*;
pub use presence::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings for the live-activity service.
///
/// ```json
/// {
///   "server": { "port": 5050, "wsPath": "/ws" },
///   "presence": { "windowSecs": 600 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveSettings {
    /// Listener settings.
    pub server: ServerSettings,
    /// Presence window settings.
    pub presence: PresenceSettings,
    /// Cross-origin settings.
    pub cors: CorsSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

impl LiveSettings {
    /// Reject configurations the service cannot run with.
    ///
    /// Called once at boot; a failure here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.presence.window_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "presence.windowSecs must be greater than zero".into(),
            ));
        }
        if self.presence.window_secs > MAX_PRESENCE_WINDOW_SECS {
            return Err(SettingsError::InvalidValue(format!(
                "presence.windowSecs must be at most {MAX_PRESENCE_WINDOW_SECS}, got {}",
                self.presence.window_secs
            )));
        }
        if self.presence.sweep_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "presence.sweepIntervalSecs must be greater than zero".into(),
            ));
        }
        if self.presence.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS {
            return Err(SettingsError::InvalidValue(format!(
                "presence.sweepIntervalSecs must be at most {MAX_SWEEP_INTERVAL_SECS}"
            )));
        }
        if !self.server.ws_path.starts_with('/') {
            return Err(SettingsError::InvalidValue(format!(
                "server.wsPath must start with '/', got {:?}",
                self.server.ws_path
            )));
        }
        if self.server.heartbeat_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "server.heartbeatIntervalSecs must be greater than zero".into(),
            ));
        }
        if self.server.heartbeat_interval_secs > MAX_HEARTBEAT_INTERVAL_SECS {
            return Err(SettingsError::InvalidValue(format!(
                "server.heartbeatIntervalSecs must be at most {MAX_HEARTBEAT_INTERVAL_SECS}"
            )));
        }
        if self.server.heartbeat_timeout_secs < self.server.heartbeat_interval_secs {
            return Err(SettingsError::InvalidValue(format!(
                "server.heartbeatTimeoutSecs ({}) must be >= heartbeatIntervalSecs ({})",
                self.server.heartbeat_timeout_secs, self.server.heartbeat_interval_secs
            )));
        }
        if self.server.send_queue_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "server.sendQueueCapacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
