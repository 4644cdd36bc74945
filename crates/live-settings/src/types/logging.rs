//! Logging settings.

use std::collections::BTreeMap;

use live_logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};

/// Log verbosity and encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level for every target.
    pub level: LogLevel,
    /// Line encoding.
    pub format: LogFormat,
    /// Per-target overrides, e.g. `{"live_server::websocket": "debug"}`.
    pub modules: BTreeMap<String, LogLevel>,
}

impl LoggingSettings {
    /// `EnvFilter` directive string for these settings.
    pub fn filter(&self) -> String {
        live_logging::build_filter(
            self.level,
            self.modules.iter().map(|(target, level)| (target.as_str(), *level)),
        )
    }
}
