//! Event records and their JSON wire encoding.
//!
//! Two shapes go out over a channel:
//!
//! | Record | Frame |
//! |--------|-------|
//! | domain event | `{"type": <kind>, "data": <payload>}` |
//! | tracked action | `{"type": "user_action", "actionType", "payload", "user", "timestamp"}` |

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Kind tag for a newly created order.
pub const ORDER_CREATED: &str = "order.created";
/// Kind tag for a tracked storefront action.
pub const USER_ACTION: &str = "user_action";
/// User label attached to actions without an identity.
pub const ANONYMOUS_USER: &str = "Anonymous";
/// Inbound request type asking for the active user count.
pub const GET_ACTIVE_USERS: &str = "get_active_users";
/// Outbound reply type carrying the active user count.
pub const ACTIVE_USERS_COUNT: &str = "active_users_count";

/// An immutable notification fanned out to every open channel.
///
/// Records are transient: built at the ingress boundary, encoded once per
/// publish, then dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum EventRecord {
    /// A business-level occurrence reported by another service (e.g. `order.created`).
    Domain {
        /// Kind tag, sent as the frame `type`.
        kind: String,
        /// Representation of the affected entity.
        data: Value,
        /// Moment the event was reported.
        timestamp: DateTime<Utc>,
    },
    /// A storefront action tracked from a browser session.
    UserAction {
        /// Action name such as `page_view` or `add_to_cart`.
        action_type: String,
        /// Free-form action details.
        payload: Value,
        /// Acting user, `None` for anonymous visitors.
        user: Option<String>,
        /// Moment the action was reported.
        timestamp: DateTime<Utc>,
    },
}

impl EventRecord {
    /// Build a domain event stamped with the current time.
    pub fn domain(kind: impl Into<String>, data: Value) -> Self {
        Self::Domain {
            kind: kind.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Build a tracked-action event stamped with the current time.
    pub fn user_action(
        action_type: impl Into<String>,
        payload: Value,
        user: Option<String>,
    ) -> Self {
        Self::UserAction {
            action_type: action_type.into(),
            payload,
            user,
            timestamp: Utc::now(),
        }
    }

    /// The frame `type` this record is sent under.
    pub fn kind(&self) -> &str {
        match self {
            Self::Domain { kind, .. } => kind,
            Self::UserAction { .. } => USER_ACTION,
        }
    }

    /// When the record was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Domain { timestamp, .. } | Self::UserAction { timestamp, .. } => *timestamp,
        }
    }

    /// Encode the record as the JSON text frame sent to channels.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.wire())
    }

    /// Encode the record as a JSON value (same shape as [`Self::to_json`]).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.wire())
    }

    fn wire(&self) -> WireFrame<'_> {
        match self {
            Self::Domain { kind, data, .. } => WireFrame::Domain { kind, data },
            Self::UserAction {
                action_type,
                payload,
                user,
                timestamp,
            } => WireFrame::UserAction {
                kind: USER_ACTION,
                action_type,
                payload,
                user: user.as_deref().unwrap_or(ANONYMOUS_USER),
                timestamp: format_timestamp(*timestamp),
            },
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireFrame<'a> {
    Domain {
        #[serde(rename = "type")]
        kind: &'a str,
        data: &'a Value,
    },
    #[serde(rename_all = "camelCase")]
    UserAction {
        #[serde(rename = "type")]
        kind: &'static str,
        action_type: &'a str,
        payload: &'a Value,
        user: &'a str,
        timestamp: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn domain_frame_has_type_and_data_only() {
        let event = EventRecord::Domain {
            kind: ORDER_CREATED.into(),
            data: json!({"_id": "o1", "total": 500}),
            timestamp: fixed_ts(),
        };
        let value = event.to_value().unwrap();
        assert_eq!(
            value,
            json!({"type": "order.created", "data": {"_id": "o1", "total": 500}})
        );
    }

    #[test]
    fn user_action_frame_shape() {
        let event = EventRecord::UserAction {
            action_type: "page_view".into(),
            payload: json!({"page": "/products"}),
            user: Some("u1".into()),
            timestamp: fixed_ts(),
        };
        let value = event.to_value().unwrap();
        assert_eq!(value["type"], "user_action");
        assert_eq!(value["actionType"], "page_view");
        assert_eq!(value["payload"]["page"], "/products");
        assert_eq!(value["user"], "u1");
        assert_eq!(value["timestamp"], "2026-01-01T12:30:00.000Z");
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn anonymous_user_label() {
        let event = EventRecord::user_action("search", json!({"query": "ghee"}), None);
        let value = event.to_value().unwrap();
        assert_eq!(value["user"], ANONYMOUS_USER);
    }

    #[test]
    fn kind_reports_frame_type() {
        assert_eq!(EventRecord::domain("order.created", json!({})).kind(), "order.created");
        assert_eq!(
            EventRecord::user_action("click", json!({}), None).kind(),
            USER_ACTION
        );
    }

    #[test]
    fn to_json_matches_to_value() {
        let event = EventRecord::domain(ORDER_CREATED, json!({"total": 1}));
        let text = event.to_json().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event.to_value().unwrap());
    }

    #[test]
    fn constructors_stamp_current_time() {
        let before = Utc::now();
        let event = EventRecord::domain(ORDER_CREATED, Value::Null);
        assert!(event.timestamp() >= before);
        assert!(event.timestamp() <= Utc::now());
    }

    #[test]
    fn timestamp_format_is_millis_zulu() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 13, 15, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2026-02-13T15:30:00.000Z");
    }
}
