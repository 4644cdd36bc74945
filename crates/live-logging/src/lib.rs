//! # live-logging
//!
//! Structured logging with `tracing`.
//!
//! `RUST_LOG` always wins. Without it, the filter is built from a default
//! level plus per-target overrides (e.g. `live_server::websocket=debug`).

#![deny(unsafe_code)]

pub mod types;

pub use types::{LogFormat, LogLevel};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Build an `EnvFilter` directive string from a default level and per-target overrides.
pub fn build_filter<'a, I>(default_level: LogLevel, modules: I) -> String
where
    I: IntoIterator<Item = (&'a str, LogLevel)>,
{
    let mut filter = default_level.as_filter_str().to_owned();
    for (target, level) in modules {
        filter.push(',');
        filter.push_str(target);
        filter.push('=');
        filter.push_str(level.as_filter_str());
    }
    filter
}

/// Resolve the effective filter: `RUST_LOG` if set and valid, otherwise `fallback`.
pub fn resolve_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global tracing subscriber. Call once at startup.
pub fn init_subscriber(filter: &str, format: LogFormat) -> Result<(), LoggingError> {
    let env_filter = resolve_filter(filter);
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))
}
