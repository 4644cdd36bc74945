//! Error types for the live-activity core.
//!
//! None of these ever reach an HTTP caller: ingress and broadcast consume them
//! locally and log.

use thiserror::Error;

/// Errors raised while building or feeding the live-activity core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiveError {
    /// The presence window must be positive and at most one day.
    #[error("presence window must be greater than zero and at most one day")]
    InvalidPresenceWindow,
    /// A server setting the runtime cannot work with.
    #[error("invalid server config: {0}")]
    InvalidConfig(String),
    /// An event arrived without a usable kind tag.
    #[error("malformed event: {0}")]
    MalformedEvent(String),
}

/// Why a frame could not be queued for one channel.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSendError {
    /// The channel's session has ended.
    #[error("channel closed")]
    Closed,
    /// The channel's outbound queue is full; the frame was dropped.
    #[error("send queue full")]
    QueueFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_error_display() {
        assert_eq!(
            LiveError::InvalidPresenceWindow.to_string(),
            "presence window must be greater than zero and at most one day"
        );
        assert_eq!(
            LiveError::InvalidConfig("heartbeat_interval_secs must be > 0".into()).to_string(),
            "invalid server config: heartbeat_interval_secs must be > 0"
        );
        assert_eq!(
            LiveError::MalformedEvent("missing kind".into()).to_string(),
            "malformed event: missing kind"
        );
    }

    #[test]
    fn send_error_display() {
        assert_eq!(ChannelSendError::Closed.to_string(), "channel closed");
        assert_eq!(ChannelSendError::QueueFull.to_string(), "send queue full");
    }
}
