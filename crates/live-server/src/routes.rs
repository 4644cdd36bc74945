//! HTTP ingress and query routes.
//!
//! Ingress routes always answer `200 {"success": true}`: reporting activity
//! must never be the reason a storefront request fails.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::server::AppState;

/// Body of `POST /api/analytics/track`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRequest {
    /// Action name, e.g. `page_view`.
    pub action_type: String,
    /// Free-form action details.
    pub payload: Value,
    /// Acting user, absent for anonymous visitors.
    pub user_id: Option<String>,
}

/// Body of `POST /api/analytics/events`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DomainEventRequest {
    /// Event kind, e.g. `order.created`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Entity representation.
    pub data: Value,
}

/// Response of `GET /api/analytics/active-users`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersResponse {
    /// Users inside the presence window.
    pub active_users: usize,
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// POST /api/analytics/track
pub async fn track_action(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    match serde_json::from_slice::<TrackRequest>(&body) {
        Ok(req) => {
            let payload = if req.payload.is_null() {
                json!({})
            } else {
                req.payload
            };
            state
                .live
                .report_action(&req.action_type, payload, req.user_id.as_deref());
        }
        Err(e) => warn!(error = %e, "dropping unparseable track request"),
    }
    success()
}

/// POST /api/analytics/events
pub async fn domain_event(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    match serde_json::from_slice::<DomainEventRequest>(&body) {
        Ok(req) => state.live.report_domain_event(&req.kind, req.data),
        Err(e) => warn!(error = %e, "dropping unparseable domain event"),
    }
    success()
}

/// GET /api/analytics/active-users
pub async fn active_users(State(state): State<AppState>) -> Json<ActiveUsersResponse> {
    Json(ActiveUsersResponse {
        active_users: state.live.active_count(),
    })
}
