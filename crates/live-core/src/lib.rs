//! # live-core
//!
//! Shared value types for the storefront live-activity service.
//!
//! - [`ids::ChannelId`]: opaque identity of one connected observer channel
//! - [`events::EventRecord`]: the immutable notification fanned out to channels
//! - Wire constants for the JSON frames exchanged over the channel

#![deny(unsafe_code)]

pub mod events;
pub mod ids;

pub use events::EventRecord;
pub use ids::ChannelId;
