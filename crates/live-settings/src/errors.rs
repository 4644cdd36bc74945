//! Settings error types.

use thiserror::Error;

/// Why live settings could not be produced.
///
/// Every variant is a boot-time failure; nothing here is reachable once the
/// server is running.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("could not read live settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or does not fit [`crate::LiveSettings`].
    #[error("live settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value parsed but is out of range.
    #[error("invalid live setting: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
