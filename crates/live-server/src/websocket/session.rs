//! WebSocket session lifecycle: one observer channel from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::connection::ClientConnection;
use super::handler::handle_client_message;
use super::heartbeat::{HeartbeatResult, run_heartbeat};
use crate::errors::ChannelSendError;
use crate::ingress::LiveActivity;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

/// Ping cadence and dead-peer timeout for one session.
#[derive(Clone, Copy, Debug)]
pub struct HeartbeatConfig {
    /// Time between server Ping frames.
    pub interval: Duration,
    /// Silence after which the channel is closed.
    pub timeout: Duration,
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client sent a Close frame or ended the stream.
    ClientClosed,
    /// Reading from or writing to the socket failed.
    TransportError,
    /// No client activity within the heartbeat timeout.
    HeartbeatTimeout,
    /// The broadcaster gave up on this channel.
    Evicted,
    /// The server is shutting down.
    Shutdown,
}

/// Run one observer channel to completion.
///
/// 1. Registers the channel so it starts receiving broadcasts
/// 2. Forwards queued frames to the socket in FIFO order
/// 3. Answers `get_active_users` requests on this channel only
/// 4. Pings on `heartbeat.interval` and drops silent peers
/// 5. Deregisters on any exit path
#[instrument(skip_all, fields(channel_id = %connection.id))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection: Arc<ClientConnection>,
    mut outbound: mpsc::Receiver<Arc<String>>,
    live: Arc<LiveActivity>,
    heartbeat: HeartbeatConfig,
    shutdown: CancellationToken,
) -> DisconnectReason {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let registry = live.registry().clone();

    registry.register(connection.clone());
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    info!(connections = registry.count(), "channel opened");

    let monitor_cancel = shutdown.child_token();
    let monitor = run_heartbeat(
        connection.clone(),
        heartbeat.interval,
        heartbeat.timeout,
        monitor_cancel.clone(),
    );
    tokio::pin!(monitor);

    let mut ping = tokio::time::interval_at(
        tokio::time::Instant::now() + heartbeat.interval,
        heartbeat.interval,
    );

    let reason = loop {
        tokio::select! {
            inbound = ws_rx.next() => {
                let Some(inbound) = inbound else {
                    break DisconnectReason::ClientClosed;
                };
                let msg = match inbound {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(error = %e, "socket read failed");
                        break DisconnectReason::TransportError;
                    }
                };
                connection.mark_alive();
                match msg {
                    Message::Text(text) => {
                        if let Some(reply) = handle_client_message(text.as_str(), &live) {
                            match connection.send(Arc::new(reply)) {
                                Ok(()) => {}
                                Err(ChannelSendError::QueueFull) => {
                                    debug!("send queue full, reply dropped");
                                }
                                Err(ChannelSendError::Closed) => {
                                    break DisconnectReason::TransportError;
                                }
                            }
                        }
                    }
                    Message::Binary(data) => {
                        debug!(len = data.len(), "ignoring binary frame");
                    }
                    Message::Ping(_) | Message::Pong(_) => trace!("heartbeat frame"),
                    Message::Close(_) => break DisconnectReason::ClientClosed,
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    break DisconnectReason::Evicted;
                };
                if let Err(e) = ws_tx.send(Message::Text(frame.as_str().into())).await {
                    warn!(error = %e, "socket write failed");
                    break DisconnectReason::TransportError;
                }
            }
            _ = ping.tick() => {
                trace!("ping");
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break DisconnectReason::TransportError;
                }
            }
            result = &mut monitor => {
                match result {
                    HeartbeatResult::TimedOut => {
                        warn!(
                            silent_for = ?connection.last_pong_elapsed(),
                            "client unresponsive, closing"
                        );
                        break DisconnectReason::HeartbeatTimeout;
                    }
                    HeartbeatResult::Cancelled => break DisconnectReason::Shutdown,
                }
            }
            () = connection.closed() => break DisconnectReason::Evicted,
            () = shutdown.cancelled() => break DisconnectReason::Shutdown,
        }
    };

    monitor_cancel.cancel();
    if matches!(
        reason,
        DisconnectReason::Shutdown | DisconnectReason::Evicted | DisconnectReason::HeartbeatTimeout
    ) {
        let _ = ws_tx.send(Message::Close(None)).await;
    }

    let _ = registry.deregister(&connection.id);
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
    info!(
        ?reason,
        dropped = connection.drop_count(),
        connections = registry.count(),
        "channel closed"
    );
    reason
}
