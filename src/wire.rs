//! Wire message model and outbound request builders.
//!
//! Messages are JSON objects with a `type` discriminator and, once the
//! conversation is authenticated, an integer `id` correlating requests to
//! their replies. Inbound payloads stay as raw `serde_json::Value` (depth
//! unbounded); only the `type`/`id` envelope is interpreted here.

use std::fmt;

use serde_json::{json, Value};

/// Template rendered by the bootstrap query: a JSON object with the
/// entity's id, state, and attributes, degrading to empty values when the
/// entity does not exist.
pub const BOOTSTRAP_TEMPLATE: &str = "{% set s = states[entity_id] %}\
{{ {'entity_id': entity_id,'state': (s.state if s else ''),\
'attributes': (s.attributes if s else {})} | tojson }}";

/// Inbound message kind, parsed from the `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Peer's opening message; the client must answer with `auth`.
    AuthRequired,
    /// Credential accepted.
    AuthOk,
    /// Credential rejected.
    AuthInvalid,
    /// Correlated reply terminating (or acknowledging) a request.
    Result,
    /// Correlated push event from a subscription or a streaming query.
    Event,
    /// Anything else, including a missing `type` field. Carried verbatim
    /// for the unclassified sink.
    Unknown(String),
}

impl MessageKind {
    /// Classify a decoded message.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("auth_required") => Self::AuthRequired,
            Some("auth_ok") => Self::AuthOk,
            Some("auth_invalid") => Self::AuthInvalid,
            Some("result") => Self::Result,
            Some("event") => Self::Event,
            Some(other) => Self::Unknown(other.to_string()),
            None => Self::Unknown("none".to_string()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthRequired => f.write_str("auth_required"),
            Self::AuthOk => f.write_str("auth_ok"),
            Self::AuthInvalid => f.write_str("auth_invalid"),
            Self::Result => f.write_str("result"),
            Self::Event => f.write_str("event"),
            Self::Unknown(kind) => f.write_str(kind),
        }
    }
}

/// Extract the correlation id, if the message carries one.
#[must_use]
pub fn correlation_id(value: &Value) -> Option<u64> {
    value.get("id").and_then(Value::as_u64)
}

/// Outbound `auth` message carrying the caller-supplied credential.
#[must_use]
pub fn auth(token: &str) -> Value {
    json!({"type": "auth", "access_token": token})
}

/// Outbound state-change subscription for `entity_id`.
#[must_use]
pub fn subscribe_trigger(id: u64, entity_id: &str) -> Value {
    json!({
        "id": id,
        "type": "subscribe_trigger",
        "trigger": [{"platform": "state", "entity_id": entity_id}],
    })
}

/// Outbound one-shot templated query against `entity_id`.
///
/// `report_errors` asks the peer to report rendering failures as messages
/// rather than raising them out of band.
#[must_use]
pub fn render_template(id: u64, entity_id: &str) -> Value {
    json!({
        "id": id,
        "type": "render_template",
        "template": BOOTSTRAP_TEMPLATE,
        "report_errors": true,
        "variables": {"entity_id": entity_id},
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &Value) -> Value {
        let wire = serde_json::to_string(value).expect("serialize");
        serde_json::from_str(&wire).expect("parse back")
    }

    #[test]
    fn auth_roundtrip() {
        let parsed = roundtrip(&auth("llat_secret"));
        assert_eq!(parsed["type"], "auth");
        assert_eq!(parsed["access_token"], "llat_secret");
        assert_eq!(parsed.get("id"), None);
    }

    #[test]
    fn subscribe_trigger_roundtrip() {
        let parsed = roundtrip(&subscribe_trigger(2, "light.kitchen"));
        assert_eq!(parsed["id"], 2);
        assert_eq!(parsed["type"], "subscribe_trigger");
        assert_eq!(parsed["trigger"][0]["platform"], "state");
        assert_eq!(parsed["trigger"][0]["entity_id"], "light.kitchen");
    }

    #[test]
    fn render_template_roundtrip() {
        let parsed = roundtrip(&render_template(3, "light.kitchen"));
        assert_eq!(parsed["id"], 3);
        assert_eq!(parsed["type"], "render_template");
        assert_eq!(parsed["template"], BOOTSTRAP_TEMPLATE);
        assert_eq!(parsed["report_errors"], true);
        assert_eq!(parsed["variables"]["entity_id"], "light.kitchen");
    }

    #[test]
    fn kind_classification() {
        let cases = [
            ("auth_required", MessageKind::AuthRequired),
            ("auth_ok", MessageKind::AuthOk),
            ("auth_invalid", MessageKind::AuthInvalid),
            ("result", MessageKind::Result),
            ("event", MessageKind::Event),
        ];
        for (kind, expected) in cases {
            let value = json!({"type": kind});
            assert_eq!(MessageKind::of(&value), expected);
        }

        assert_eq!(
            MessageKind::of(&json!({"type": "pong"})),
            MessageKind::Unknown("pong".to_string())
        );
        assert_eq!(
            MessageKind::of(&json!({"id": 7})),
            MessageKind::Unknown("none".to_string())
        );
    }

    #[test]
    fn correlation_id_extraction() {
        assert_eq!(correlation_id(&json!({"id": 2, "type": "result"})), Some(2));
        assert_eq!(correlation_id(&json!({"type": "auth_ok"})), None);
        assert_eq!(correlation_id(&json!({"id": "two"})), None);
        assert_eq!(correlation_id(&json!({"id": -4})), None);
    }
}
