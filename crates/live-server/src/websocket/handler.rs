//! Inbound frame handling.
//!
//! Channels are receive-only for events. The one request understood is
//! `{"type":"get_active_users"}`; everything else is ignored.

use live_core::events::{ACTIVE_USERS_COUNT, GET_ACTIVE_USERS};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::ingress::LiveActivity;

#[derive(Deserialize)]
struct ClientFrame {
    #[serde(rename = "type")]
    kind: String,
}

/// Handle one inbound text frame. Returns the reply for this channel, if any.
pub fn handle_client_message(text: &str, live: &LiveActivity) -> Option<String> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, len = text.len(), "ignoring unparseable client frame");
            return None;
        }
    };

    if frame.kind == GET_ACTIVE_USERS {
        let reply = json!({
            "type": ACTIVE_USERS_COUNT,
            "count": live.active_count(),
        });
        Some(reply.to_string())
    } else {
        debug!(kind = %frame.kind, "ignoring client frame");
        None
    }
}
