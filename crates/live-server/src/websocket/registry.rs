//! The authoritative set of open observer channels.

use std::collections::HashMap;
use std::sync::Arc;

use live_core::ChannelId;
use metrics::gauge;
use parking_lot::RwLock;
use tracing::debug;

use super::connection::ClientConnection;
use crate::metrics::WS_CONNECTIONS_ACTIVE;

/// Open channels indexed by id.
///
/// Every operation takes the lock for a bounded, non-awaiting critical
/// section, so HTTP handlers and session tasks can call it concurrently.
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: RwLock<HashMap<ChannelId, Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a freshly opened channel. It is a broadcast target immediately.
    pub fn register(&self, connection: Arc<ClientConnection>) {
        let count = {
            let mut channels = self.channels.write();
            let _ = channels.insert(connection.id.clone(), connection);
            channels.len()
        };
        gauge!(WS_CONNECTIONS_ACTIVE).set(count as f64);
    }

    /// Remove a channel. Removing an absent channel is a no-op.
    ///
    /// Returns `true` if the channel was present.
    pub fn deregister(&self, id: &ChannelId) -> bool {
        let (removed, count) = {
            let mut channels = self.channels.write();
            let removed = channels.remove(id);
            (removed, channels.len())
        };
        match removed {
            Some(_) => {
                debug!(channel_id = %id, remaining = count, "channel deregistered");
                gauge!(WS_CONNECTIONS_ACTIVE).set(count as f64);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the currently open channels.
    ///
    /// The lock is released before returning; later registrations are not
    /// part of the snapshot.
    pub fn all(&self) -> Vec<Arc<ClientConnection>> {
        self.channels.read().values().cloned().collect()
    }

    /// Look up one channel.
    pub fn get(&self, id: &ChannelId) -> Option<Arc<ClientConnection>> {
        self.channels.read().get(id).cloned()
    }

    /// Number of open channels.
    pub fn count(&self) -> usize {
        self.channels.read().len()
    }
}
