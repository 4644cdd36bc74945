//! Presence tracking settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest accepted presence window (one day).
pub const MAX_PRESENCE_WINDOW_SECS: u64 = 86_400;

/// Longest accepted sweep interval (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Trailing-window presence settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresenceSettings {
    /// Seconds a user stays active after their latest tracked action.
    pub window_secs: u64,
    /// Seconds between sweeps that drop expired entries from memory.
    pub sweep_interval_secs: u64,
}

impl PresenceSettings {
    /// The presence window as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// The sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            window_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}
