//! The live-activity service object.
//!
//! [`LiveActivity`] is built once at startup and shared (behind an `Arc`)
//! with the HTTP layer. It is the only seam the rest of the application
//! touches: order and tracking handlers report into it, the admin query
//! reads from it, and nothing it does can fail the caller's request.

use std::sync::Arc;
use std::time::Duration;

use live_core::EventRecord;
use metrics::counter;
use serde_json::Value;
use tracing::warn;

use crate::errors::LiveError;
use crate::metrics::LIVE_EVENTS_REJECTED_TOTAL;
use crate::presence::PresenceTracker;
use crate::websocket::broadcast::EventBroadcaster;
use crate::websocket::registry::ConnectionRegistry;

/// Presence tracking plus event fan-out.
pub struct LiveActivity {
    registry: Arc<ConnectionRegistry>,
    broadcaster: EventBroadcaster,
    presence: Arc<PresenceTracker>,
}

impl LiveActivity {
    /// Wire a fresh registry and broadcaster around `presence`.
    pub fn new(presence: PresenceTracker) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            broadcaster: EventBroadcaster::new(registry.clone()),
            registry,
            presence: Arc::new(presence),
        }
    }

    /// Shorthand for a tracker with the given presence window.
    pub fn with_window(window: Duration) -> Result<Self, LiveError> {
        Ok(Self::new(PresenceTracker::new(window)?))
    }

    /// Record a storefront action and broadcast it as `user_action`.
    ///
    /// Touches presence for `user_id` when present. Fire-and-forget: an
    /// empty `action_type` is logged and dropped, broadcast problems stay
    /// inside the broadcaster.
    ///
    /// An empty `user_id` is treated like `None`: no presence entry, and the
    /// event carries `"user": "Anonymous"` rather than `""`.
    pub fn report_action(&self, action_type: &str, payload: Value, user_id: Option<&str>) {
        if let Err(e) = check_kind(action_type) {
            reject(&e);
            return;
        }
        self.presence.touch(user_id);
        let user = user_id.filter(|id| !id.is_empty()).map(str::to_owned);
        let event = EventRecord::user_action(action_type, payload, user);
        let _ = self.broadcaster.publish(&event);
    }

    /// Broadcast a domain event such as `order.created`. Fire-and-forget.
    pub fn report_domain_event(&self, kind: &str, data: Value) {
        if let Err(e) = check_kind(kind) {
            reject(&e);
            return;
        }
        let _ = self.broadcaster.publish(&EventRecord::domain(kind, data));
    }

    /// Users inside the presence window right now.
    pub fn active_count(&self) -> usize {
        self.presence.active_count()
    }

    /// Open observer channels.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Presence state.
    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    /// The fan-out engine.
    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }
}

fn check_kind(kind: &str) -> Result<(), LiveError> {
    if kind.trim().is_empty() {
        Err(LiveError::MalformedEvent("missing kind".into()))
    } else {
        Ok(())
    }
}

fn reject(error: &LiveError) {
    counter!(LIVE_EVENTS_REJECTED_TOTAL).increment(1);
    warn!(error = %error, "event rejected at ingress");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::connection::ClientConnection;
    use live_core::events::{ANONYMOUS_USER, ORDER_CREATED};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn live() -> LiveActivity {
        LiveActivity::with_window(Duration::from_secs(300)).unwrap()
    }

    fn open(live: &LiveActivity) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (conn, rx) = ClientConnection::channel(16);
        live.registry().register(conn.clone());
        (conn, rx)
    }

    fn next_frame(rx: &mut mpsc::Receiver<Arc<String>>) -> Value {
        serde_json::from_str(&rx.try_recv().unwrap()).unwrap()
    }

    #[test]
    fn zero_window_is_a_startup_error() {
        assert!(matches!(
            LiveActivity::with_window(Duration::ZERO),
            Err(LiveError::InvalidPresenceWindow)
        ));
    }

    #[test]
    fn oversized_window_is_a_startup_error() {
        assert!(matches!(
            LiveActivity::with_window(Duration::from_secs(u64::MAX)),
            Err(LiveError::InvalidPresenceWindow)
        ));
    }

    #[test]
    fn longest_window_action_is_counted() {
        let live = LiveActivity::with_window(crate::presence::MAX_PRESENCE_WINDOW).unwrap();
        let (_a, mut rx) = open(&live);

        live.report_action("page_view", json!({}), Some("u1"));

        assert_eq!(live.active_count(), 1);
        assert_eq!(next_frame(&mut rx)["user"], "u1");
    }

    #[test]
    fn order_created_reaches_every_channel() {
        let live = live();
        let (_a, mut rx_a) = open(&live);
        let (_b, mut rx_b) = open(&live);

        live.report_domain_event(ORDER_CREATED, json!({"_id": "o1", "total": 500}));

        let expected = json!({"type": "order.created", "data": {"_id": "o1", "total": 500}});
        assert_eq!(next_frame(&mut rx_a), expected);
        assert_eq!(next_frame(&mut rx_b), expected);
    }

    #[test]
    fn failed_channel_removed_and_presence_still_counted() {
        let live = live();
        let (a, rx_a) = open(&live);
        drop(rx_a);

        live.report_action("page_view", json!({"page": "/products"}), Some("u1"));

        assert_eq!(live.active_count(), 1);
        assert!(live.registry().get(&a.id).is_none());
        let report = live
            .broadcaster()
            .publish(&EventRecord::domain(ORDER_CREATED, json!({})));
        assert_eq!(report.attempted, 0);
    }

    #[test]
    fn anonymous_action_broadcast_without_presence() {
        let live = live();
        let (_a, mut rx) = open(&live);

        live.report_action("search", json!({"query": "ghee"}), None);

        assert_eq!(live.active_count(), 0);
        let frame = next_frame(&mut rx);
        assert_eq!(frame["type"], "user_action");
        assert_eq!(frame["actionType"], "search");
        assert_eq!(frame["payload"]["query"], "ghee");
        assert_eq!(frame["user"], ANONYMOUS_USER);
        assert!(frame["timestamp"].is_string());
    }

    #[test]
    fn empty_user_is_anonymous() {
        let live = live();
        let (_a, mut rx) = open(&live);
        live.report_action("click", json!({}), Some(""));
        assert_eq!(live.active_count(), 0);
        assert_eq!(next_frame(&mut rx)["user"], ANONYMOUS_USER);
    }

    #[test]
    fn identified_action_carries_user() {
        let live = live();
        let (_a, mut rx) = open(&live);
        live.report_action("add_to_cart", json!({"productId": "p1"}), Some("u7"));
        assert_eq!(next_frame(&mut rx)["user"], "u7");
    }

    #[test]
    fn repeated_actions_count_user_once() {
        let live = live();
        for _ in 0..5 {
            live.report_action("page_view", json!({}), Some("u1"));
        }
        live.report_action("page_view", json!({}), Some("u2"));
        assert_eq!(live.active_count(), 2);
    }

    #[test]
    fn missing_kind_is_dropped() {
        let live = live();
        let (_a, mut rx) = open(&live);

        live.report_action("", json!({}), Some("u1"));
        live.report_domain_event("  ", json!({}));

        assert_eq!(live.active_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reports_without_observers_never_fail() {
        let live = live();
        for i in 0..1000 {
            live.report_domain_event(ORDER_CREATED, json!({"seq": i}));
            live.report_action("page_view", json!({}), None);
        }
        assert_eq!(live.registry().count(), 0);
    }

    #[test]
    fn events_arrive_in_report_order() {
        let live = live();
        let (_a, mut rx) = open(&live);
        live.report_domain_event(ORDER_CREATED, json!({"seq": 1}));
        live.report_action("page_view", json!({}), None);
        live.report_domain_event(ORDER_CREATED, json!({"seq": 2}));

        assert_eq!(next_frame(&mut rx)["data"]["seq"], 1);
        assert_eq!(next_frame(&mut rx)["type"], "user_action");
        assert_eq!(next_frame(&mut rx)["data"]["seq"], 2);
    }
}
