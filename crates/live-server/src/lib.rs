//! # live-server
//!
//! In-process live-activity layer for the storefront admin dashboard.
//!
//! - [`presence::PresenceTracker`] approximates "active users" over a trailing window
//! - [`websocket::registry::ConnectionRegistry`] owns the set of open observer channels
//! - [`websocket::broadcast::EventBroadcaster`] fans each event out to every channel
//! - [`ingress::LiveActivity`] is the only seam the rest of the application touches
//! - [`server::LiveServer`] exposes it all over Axum (HTTP routes + `/ws`)

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod ingress;
pub mod metrics;
pub mod presence;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use errors::{ChannelSendError, LiveError};
pub use ingress::LiveActivity;
pub use server::LiveServer;
