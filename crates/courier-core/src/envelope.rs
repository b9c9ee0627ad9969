//! Inbound envelope normalization.
//!
//! Two shapes arrive on the wire; both decode into one [`Command`]:
//!
//! - Nested (canonical): `{"type": "SEND_MESSAGE", "chatId": ..., ...}` —
//!   every sibling of `type` becomes a payload field.
//! - Flattened legacy: `{"action": "SEND_MESSAGE", "payload": {...}}`.
//!
//! The legacy shape is a compatibility shim for old clients; `type` wins
//! when an envelope carries both discriminators.

use serde_json::{Map, Value};

use crate::error::RelayError;

/// Normalized form of one inbound envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Symbolic action name, e.g. `SEND_MESSAGE`.
    pub action: String,
    /// Opaque action arguments.
    pub payload: Map<String, Value>,
}

impl Command {
    /// String payload field, if present and non-empty.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Decode one envelope into a [`Command`], accepting both tolerated shapes.
pub fn normalize(raw: Value) -> Result<Command, RelayError> {
    let Value::Object(mut obj) = raw else {
        return Err(RelayError::ClientInput(
            "Expected a JSON object".to_string(),
        ));
    };

    if let Some(action) = take_string(&mut obj, "type") {
        // Nested shape: remaining siblings are the payload.
        return Ok(Command {
            action,
            payload: obj,
        });
    }

    if let Some(action) = take_string(&mut obj, "action") {
        // Flattened legacy shape: payload is an optional nested object.
        let payload = match obj.remove("payload") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(payload)) => payload,
            Some(_) => {
                return Err(RelayError::ClientInput(
                    "Envelope payload must be an object".to_string(),
                ));
            }
        };
        return Ok(Command { action, payload });
    }

    Err(RelayError::ClientInput(
        "Envelope is missing an action".to_string(),
    ))
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(other) => {
            // Put non-string values back so a legacy `action` can still match.
            let _ = obj.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_shape_flattens_siblings_into_payload() {
        let cmd = normalize(json!({
            "type": "SEND_MESSAGE",
            "chatId": "chat_1",
            "message": {"content": "hi"},
        }))
        .unwrap();
        assert_eq!(cmd.action, "SEND_MESSAGE");
        assert_eq!(cmd.str_field("chatId"), Some("chat_1"));
        assert_eq!(cmd.payload["message"]["content"], "hi");
    }

    #[test]
    fn legacy_shape_uses_nested_payload() {
        let cmd = normalize(json!({
            "action": "GET_CHAT_HISTORY",
            "payload": {"chatId": "chat_2"},
        }))
        .unwrap();
        assert_eq!(cmd.action, "GET_CHAT_HISTORY");
        assert_eq!(cmd.str_field("chatId"), Some("chat_2"));
    }

    #[test]
    fn legacy_shape_without_payload_gets_empty_map() {
        let cmd = normalize(json!({"action": "GET_CHATS"})).unwrap();
        assert_eq!(cmd.action, "GET_CHATS");
        assert!(cmd.payload.is_empty());
    }

    #[test]
    fn type_wins_over_action() {
        let cmd = normalize(json!({
            "type": "GET_CHATS",
            "action": "DELETE_CHAT",
        }))
        .unwrap();
        assert_eq!(cmd.action, "GET_CHATS");
    }

    #[test]
    fn missing_action_is_a_client_input_error() {
        let err = normalize(json!({"chatId": "chat_1"})).unwrap_err();
        assert!(matches!(err, RelayError::ClientInput(_)));
    }

    #[test]
    fn empty_action_string_is_rejected() {
        let err = normalize(json!({"type": ""})).unwrap_err();
        assert!(matches!(err, RelayError::ClientInput(_)));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = normalize(json!({"action": "GET_CHATS", "payload": [1, 2]})).unwrap_err();
        assert!(matches!(err, RelayError::ClientInput(_)));
    }

    #[test]
    fn non_object_envelope_is_rejected() {
        let err = normalize(json!("SEND_MESSAGE")).unwrap_err();
        assert!(matches!(err, RelayError::ClientInput(_)));
    }

    #[test]
    fn str_field_ignores_empty_strings() {
        let cmd = normalize(json!({"type": "DELETE_CHAT", "chatId": ""})).unwrap();
        assert_eq!(cmd.str_field("chatId"), None);
    }
}
