//! # live-settings
//!
//! Layered configuration for the live-activity service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** from [`LiveSettings::default()`]
//! 2. **Settings file** at `~/.storefront/live-settings.json` (deep-merged over defaults)
//! 3. **Environment variables** such as `PORT` and `LIVE_PRESENCE_WINDOW_SECS`
//!
//! Command-line flags are applied on top by the binary. Call
//! [`LiveSettings::validate`] once everything is layered.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides_from, deep_merge, load_file, load_settings,
    load_settings_from_path, settings_path,
};
pub use types::*;
