//! WebSocket observer channels: connection state, registry, fan-out, and session lifecycle.

pub mod broadcast;
pub mod connection;
pub mod handler;
pub mod heartbeat;
pub mod registry;
pub mod session;
