//! Trailing-window "active users" approximation.
//!
//! Each touch stores a deadline of `now + window`. Reads count only entries
//! whose deadline is still in the future, so expiry is correct without any
//! timers. A single periodic sweep reclaims memory. Deadlines use tokio's
//! clock so paused-time tests drive expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::LiveError;
use crate::metrics::{PRESENCE_ACTIVE_USERS, PRESENCE_EXPIRED_TOTAL};

/// Longest window [`PresenceTracker::new`] accepts.
pub const MAX_PRESENCE_WINDOW: Duration =
    Duration::from_secs(live_settings::MAX_PRESENCE_WINDOW_SECS);

/// Set of recently active user ids with self-expiring membership.
pub struct PresenceTracker {
    window: Duration,
    deadlines: Mutex<HashMap<String, Instant>>,
}

impl PresenceTracker {
    /// Create a tracker. The window must be non-zero and at most
    /// [`MAX_PRESENCE_WINDOW`].
    pub fn new(window: Duration) -> Result<Self, LiveError> {
        if window.is_zero() || window > MAX_PRESENCE_WINDOW {
            return Err(LiveError::InvalidPresenceWindow);
        }
        Ok(Self {
            window,
            deadlines: Mutex::new(HashMap::new()),
        })
    }

    /// The configured window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Mark `user_id` active now. `None` and `""` are ignored.
    pub fn touch(&self, user_id: Option<&str>) {
        self.touch_at(user_id, Instant::now());
    }

    /// Mark `user_id` active as of `now`, replacing any earlier deadline.
    pub fn touch_at(&self, user_id: Option<&str>, now: Instant) {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return;
        };
        // unreachable with a bounded window; skip rather than panic
        let Some(deadline) = now.checked_add(self.window) else {
            debug!(user_id, "presence deadline overflow, touch skipped");
            return;
        };
        let _ = self
            .deadlines
            .lock()
            .insert(user_id.to_owned(), deadline);
    }

    /// Distinct users whose window has not elapsed.
    pub fn active_count(&self) -> usize {
        self.active_count_at(Instant::now())
    }

    /// Distinct users whose deadline is after `now`.
    pub fn active_count_at(&self, now: Instant) -> usize {
        self.deadlines
            .lock()
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drop entries whose deadline is at or before `now`.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut deadlines = self.deadlines.lock();
        let before = deadlines.len();
        deadlines.retain(|_, deadline| *deadline > now);
        before - deadlines.len()
    }

    /// Entries held in memory, expired or not.
    pub fn tracked_len(&self) -> usize {
        self.deadlines.lock().len()
    }
}

/// Spawn the periodic sweep. Stops when `cancel` fires.
pub fn start_sweep_task(
    presence: Arc<PresenceTracker>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick is immediate
        let _ = ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = presence.sweep();
                    let active = presence.active_count();
                    gauge!(PRESENCE_ACTIVE_USERS).set(active as f64);
                    if removed > 0 {
                        counter!(PRESENCE_EXPIRED_TOTAL).increment(removed as u64);
                        debug!(removed, active, "presence sweep");
                    }
                }
                () = cancel.cancelled() => break,
            }
        }
    })
}
