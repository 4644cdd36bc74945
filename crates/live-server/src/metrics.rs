//! Prometheus recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup. Fails if another recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Observer channels opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Observer channels closed (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Open observer channels (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Channel lifetime in seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Upgrades refused by the connection cap (counter).
pub const WS_CONNECTIONS_REJECTED_TOTAL: &str = "ws_connections_rejected_total";
/// Events handed to the broadcaster (counter, labels: kind).
pub const LIVE_EVENTS_PUBLISHED_TOTAL: &str = "live_events_published_total";
/// Malformed events refused at ingress (counter).
pub const LIVE_EVENTS_REJECTED_TOTAL: &str = "live_events_rejected_total";
/// Frames dropped on a full channel queue (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Frames sent to a closed channel (counter).
pub const WS_SEND_FAILURES_TOTAL: &str = "ws_send_failures_total";
/// Users inside the presence window as of the last sweep (gauge).
pub const PRESENCE_ACTIVE_USERS: &str = "presence_active_users";
/// Presence entries reclaimed by the sweep (counter).
pub const PRESENCE_EXPIRED_TOTAL: &str = "presence_expired_total";
