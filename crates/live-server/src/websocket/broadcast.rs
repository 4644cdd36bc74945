//! Event fan-out to every open channel.

use std::sync::Arc;

use live_core::EventRecord;
use metrics::counter;
use tracing::{debug, warn};

use super::registry::ConnectionRegistry;
use crate::errors::ChannelSendError;
use crate::metrics::{
    LIVE_EVENTS_PUBLISHED_TOTAL, WS_BROADCAST_DROPS_TOTAL, WS_SEND_FAILURES_TOTAL,
};

/// Drops tolerated on one channel before it is evicted as a dead consumer.
pub const MAX_DROPPED_FRAMES: u64 = 100;

/// Outcome of one [`EventBroadcaster::publish`] call.
///
/// Informational only; callers must not treat broadcast as a failure point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Channels in the snapshot.
    pub attempted: usize,
    /// Channels the frame was queued on.
    pub delivered: usize,
    /// Channels whose queue was full.
    pub dropped: usize,
    /// Channels deregistered during this publish.
    pub removed: usize,
}

/// Fans each event out to the registry's current snapshot.
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl EventBroadcaster {
    /// Create a broadcaster over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every channel registered at call time.
    ///
    /// Never fails and never waits: the frame is encoded once and queued on
    /// each channel. A closed channel, or one past [`MAX_DROPPED_FRAMES`], is
    /// deregistered and the remaining channels still receive the event.
    pub fn publish(&self, event: &EventRecord) -> PublishReport {
        let kind = event.kind();
        let frame = match event.to_json() {
            Ok(json) => Arc::new(json),
            Err(e) => {
                warn!(kind, error = %e, "failed to serialize event");
                return PublishReport::default();
            }
        };
        counter!(LIVE_EVENTS_PUBLISHED_TOTAL, "kind" => kind.to_owned()).increment(1);

        let channels = self.registry.all();
        let mut report = PublishReport {
            attempted: channels.len(),
            ..PublishReport::default()
        };

        for conn in channels {
            match conn.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(ChannelSendError::QueueFull) => {
                    report.dropped += 1;
                    counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                    let drops = conn.drop_count();
                    if drops >= MAX_DROPPED_FRAMES {
                        warn!(channel_id = %conn.id, drops, "evicting slow channel");
                        conn.close();
                        if self.registry.deregister(&conn.id) {
                            report.removed += 1;
                        }
                    } else {
                        debug!(channel_id = %conn.id, drops, "send queue full, frame dropped");
                    }
                }
                Err(ChannelSendError::Closed) => {
                    warn!(channel_id = %conn.id, kind, "send failed, deregistering channel");
                    counter!(WS_SEND_FAILURES_TOTAL).increment(1);
                    if self.registry.deregister(&conn.id) {
                        report.removed += 1;
                    }
                }
            }
        }

        debug!(
            kind,
            recipients = report.attempted,
            delivered = report.delivered,
            dropped = report.dropped,
            removed = report.removed,
            "broadcast event"
        );
        report
    }

    /// The registry this broadcaster reads from.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::connection::ClientConnection;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    fn setup() -> (Arc<ConnectionRegistry>, EventBroadcaster) {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = EventBroadcaster::new(registry.clone());
        (registry, broadcaster)
    }

    fn open(
        registry: &ConnectionRegistry,
        capacity: usize,
    ) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (conn, rx) = ClientConnection::channel(capacity);
        registry.register(conn.clone());
        (conn, rx)
    }

    fn order_created() -> EventRecord {
        EventRecord::domain("order.created", json!({"_id": "o1", "total": 500}))
    }

    fn recv_json(rx: &mut mpsc::Receiver<Arc<String>>) -> Value {
        let frame = rx.try_recv().unwrap();
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn fans_out_to_every_channel() {
        let (registry, broadcaster) = setup();
        let mut receivers: Vec<_> = (0..5).map(|_| open(&registry, 8).1).collect();

        let report = broadcaster.publish(&order_created());
        assert_eq!(report.attempted, 5);
        assert_eq!(report.delivered, 5);

        for rx in &mut receivers {
            let frame = recv_json(rx);
            assert_eq!(
                frame,
                json!({"type": "order.created", "data": {"_id": "o1", "total": 500}})
            );
        }
    }

    #[test]
    fn no_channels_is_a_noop() {
        let (_registry, broadcaster) = setup();
        for _ in 0..1000 {
            let report = broadcaster.publish(&order_created());
            assert_eq!(report, PublishReport::default());
        }
    }

    #[test]
    fn closed_channel_is_removed_and_others_still_receive() {
        let (registry, broadcaster) = setup();
        let (_a, mut rx_a) = open(&registry, 8);
        let (b, rx_b) = open(&registry, 8);
        let (_c, mut rx_c) = open(&registry, 8);
        drop(rx_b);

        let report = broadcaster.publish(&order_created());
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.removed, 1);
        assert!(registry.get(&b.id).is_none());
        assert_eq!(recv_json(&mut rx_a)["type"], "order.created");
        assert_eq!(recv_json(&mut rx_c)["type"], "order.created");

        let second = broadcaster.publish(&order_created());
        assert_eq!(second.attempted, 2);
        assert_eq!(second.removed, 0);
    }

    #[test]
    fn full_queue_drops_for_that_channel_only() {
        let (registry, broadcaster) = setup();
        let (slow, _rx_slow) = open(&registry, 1);
        let (_fast, mut rx_fast) = open(&registry, 8);

        let _ = broadcaster.publish(&order_created());
        let report = broadcaster.publish(&order_created());

        assert_eq!(report.dropped, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(slow.drop_count(), 1);
        assert!(registry.get(&slow.id).is_some());
        assert!(rx_fast.try_recv().is_ok());
        assert!(rx_fast.try_recv().is_ok());
    }

    #[test]
    fn slow_channel_evicted_after_drop_threshold() {
        let (registry, broadcaster) = setup();
        let (slow, _rx_slow) = open(&registry, 1);

        let _ = broadcaster.publish(&order_created());
        for _ in 0..MAX_DROPPED_FRAMES {
            let _ = broadcaster.publish(&order_created());
        }

        assert!(registry.get(&slow.id).is_none());
        assert!(slow.is_closing());
    }

    #[test]
    fn per_channel_order_is_publish_order() {
        let (registry, broadcaster) = setup();
        let (_a, mut rx) = open(&registry, 16);

        for i in 0..10 {
            let _ = broadcaster.publish(&EventRecord::domain("order.created", json!({"seq": i})));
        }
        for i in 0..10 {
            assert_eq!(recv_json(&mut rx)["data"]["seq"], i);
        }
    }

    #[test]
    fn late_registration_misses_earlier_event() {
        let (registry, broadcaster) = setup();
        let _ = broadcaster.publish(&order_created());
        let (_late, mut rx) = open(&registry, 8);
        assert!(rx.try_recv().is_err());
    }
}
