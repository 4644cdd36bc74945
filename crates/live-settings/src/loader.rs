//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LiveSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use live_logging::{LogFormat, LogLevel};
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{LiveSettings, MAX_PRESENCE_WINDOW_SECS, MAX_SWEEP_INTERVAL_SECS};

/// Resolve the path to the settings file (`~/.storefront/live-settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".storefront")
        .join("live-settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LiveSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<LiveSettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file(path: &Path) -> Result<LiveSettings> {
    let defaults = serde_json::to_value(LiveSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut LiveSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Integers must parse and fall within range; invalid values are logged and
/// ignored. `LIVE_PRESENCE_WINDOW_SECS` accepts `0` so that validation can
/// reject it loudly instead of the override being dropped.
pub fn apply_overrides_from<F>(settings: &mut LiveSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.string("LIVE_WS_PATH") {
        settings.server.ws_path = v;
    }
    if let Some(v) = env.usize("LIVE_MAX_CONNECTIONS", 1, 100_000) {
        settings.server.max_connections = v;
    }

    // ── Presence ────────────────────────────────────────────────────
    if let Some(v) = env.u64("LIVE_PRESENCE_WINDOW_SECS", 0, MAX_PRESENCE_WINDOW_SECS) {
        settings.presence.window_secs = v;
    }
    if let Some(v) = env.u64("LIVE_PRESENCE_SWEEP_SECS", 1, MAX_SWEEP_INTERVAL_SECS) {
        settings.presence.sweep_interval_secs = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(raw) = env.string("LOG_LEVEL") {
        match LogLevel::parse(&raw) {
            Some(level) => settings.logging.level = level,
            None => tracing::warn!(key = "LOG_LEVEL", value = %raw, "unknown log level, ignoring"),
        }
    }
    if let Some(raw) = env.string("LOG_FORMAT") {
        match LogFormat::parse(&raw) {
            Some(format) => settings.logging.format = format,
            None => tracing::warn!(key = "LOG_FORMAT", value = %raw, "unknown log format, ignoring"),
        }
    }

    // ── CORS ────────────────────────────────────────────────────────
    if let Some(v) = env.string("CORS_ORIGINS") {
        for origin in parse_origin_list(&v) {
            push_unique(&mut settings.cors.allowed_origins, origin);
        }
    }
    if let Some(v) = env.string("FRONTEND_URL") {
        push_unique(&mut settings.cors.allowed_origins, v.trim().to_string());
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origin_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

// ── Env readers (thin wrappers) ─────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.string(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}
