//! Observer channel state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use live_core::ChannelId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::errors::ChannelSendError;

/// One open observer channel (an admin dashboard socket).
///
/// Frames are queued on a bounded channel drained by the session task, so a
/// send never waits on the network.
pub struct ClientConnection {
    /// Channel identity.
    pub id: ChannelId,
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has shown activity since the last heartbeat tick.
    pub is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    /// Frames dropped because the queue was full.
    pub dropped_messages: AtomicU64,
    closed: CancellationToken,
}

impl ClientConnection {
    /// Create a connection around an existing sender.
    pub fn new(id: ChannelId, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
            closed: CancellationToken::new(),
        }
    }

    /// Create a connection with a fresh id and a queue of `capacity` frames.
    ///
    /// `capacity` is clamped to at least one frame.
    pub fn channel(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Arc::new(Self::new(ChannelId::new(), tx)), rx)
    }

    /// Queue a text frame without waiting.
    ///
    /// A full queue drops the frame and bumps the drop counter.
    pub fn send(&self, frame: Arc<String>) -> Result<(), ChannelSendError> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                Err(ChannelSendError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(ChannelSendError::Closed),
        }
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Record inbound activity (pong or any frame).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Time since the last recorded activity.
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Ask the session task to close this channel.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether [`Self::close`] has been called.
    pub fn is_closing(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once [`Self::close`] has been called.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("dropped", &self.drop_count())
            .field("closing", &self.is_closing())
            .finish_non_exhaustive()
    }
}
