//! Heartbeat liveness monitoring.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use super::connection::ClientConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// No client activity for the whole timeout.
    TimedOut,
    /// Stopped from outside.
    Cancelled,
}

/// Watch a connection's alive flag until it goes quiet or `cancel` fires.
///
/// Every `interval` the flag is checked and cleared. After
/// `timeout / interval` consecutive quiet ticks (at least one) the
/// connection is reported dead. The session sends the actual Ping frames;
/// any inbound frame marks the connection alive.
pub async fn run_heartbeat(
    connection: Arc<ClientConnection>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    let max_missed = max_missed_ticks(interval, timeout);
    let mut missed: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if connection.check_alive() {
                    missed = 0;
                } else {
                    missed += 1;
                    if missed >= max_missed {
                        return HeartbeatResult::TimedOut;
                    }
                }
            }
            () = cancel.cancelled() => return HeartbeatResult::Cancelled,
        }
    }
}

fn max_missed_ticks(interval: Duration, timeout: Duration) -> u32 {
    let interval_ms = interval.as_millis().max(1);
    let ticks = (timeout.as_millis() / interval_ms).max(1);
    u32::try_from(ticks).unwrap_or(u32::MAX)
}
