//! Persisted domain model and device-facing body types.
//!
//! Timestamps are RFC 3339 strings throughout — the store keeps them as
//! text and orders lexicographically, which is equivalent for RFC 3339.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ids;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human turn.
    User,
    /// Model turn.
    Assistant,
    /// Prompt scaffolding.
    System,
}

impl Role {
    /// Wire/database string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

/// One conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Opaque unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether this chat is the active target for its device.
    pub active: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Originating device, for chats created by first device contact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl Chat {
    /// New inactive chat with a fresh ID and the current timestamp.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ids::chat_id(),
            name: name.into(),
            active: false,
            created_at: Utc::now().to_rfc3339(),
            device_id: None,
        }
    }

    /// New active chat bound to a device.
    pub fn for_device(device_id: &str) -> Self {
        Self {
            id: ids::chat_id(),
            name: format!("Device Chat - {device_id}"),
            active: true,
            created_at: Utc::now().to_rfc3339(),
            device_id: Some(device_id.to_string()),
        }
    }
}

/// One message in a chat. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the owning chat.
    pub id: String,
    /// Owning chat (the store's partition key for messages).
    pub chat_id: String,
    /// Text content.
    pub content: String,
    /// Author role.
    pub role: Role,
    /// RFC 3339 creation timestamp; ordering key within a chat.
    pub created_at: String,
}

impl Message {
    /// New message with a fresh ID and the current timestamp.
    pub fn new(chat_id: &str, role: Role, content: impl Into<String>) -> Self {
        Self::with_id(ids::message_id(), chat_id, role, content)
    }

    /// New message with an explicit ID (assistant turns reuse the trace ID).
    pub fn with_id(
        id: String,
        chat_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            chat_id: chat_id.to_string(),
            content: content.into(),
            role,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Idempotency record for one upstream feed event.
///
/// `id` equals the upstream delivery ID; at most one row per ID ever exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    /// Upstream delivery ID.
    pub id: String,
    /// Originating device.
    pub device_id: String,
    /// RFC 3339 timestamp of first processing.
    pub processed_at: String,
}

/// A `{role, content}` pair handed to the generation backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Turn role.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl PromptMessage {
    /// Convenience constructor.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Inbound body of one device event.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeviceRequest {
    /// Free-text user message.
    pub message: String,
    /// Optional prior-turn history supplied by the device.
    #[serde(default)]
    pub conversation: Vec<PromptMessage>,
    /// Device self-identification (event metadata wins when both present).
    #[serde(default)]
    pub device_id: Option<String>,
    /// Device-side timestamp, echoed for diagnostics only.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Set by device-side test harnesses; processed normally.
    #[serde(default)]
    pub device_test: bool,
}

/// Body pushed back to a device after a completed exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceResponse {
    /// Full assistant text.
    pub response: String,
    /// Chat the exchange was recorded in.
    pub conversation_id: String,
    /// Persisted assistant message ID.
    pub message_id: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl DeviceResponse {
    /// Response for a finished exchange, stamped now.
    pub fn new(response: impl Into<String>, conversation_id: &str, message_id: &str) -> Self {
        Self {
            response: response.into(),
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("bot"), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn new_chat_is_inactive() {
        let chat = Chat::new("Test");
        assert_eq!(chat.name, "Test");
        assert!(!chat.active);
        assert!(chat.device_id.is_none());
        assert!(chat.id.starts_with("chat_"));
    }

    #[test]
    fn device_chat_is_active_and_tagged() {
        let chat = Chat::for_device("pi-kitchen");
        assert!(chat.active);
        assert_eq!(chat.device_id.as_deref(), Some("pi-kitchen"));
        assert_eq!(chat.name, "Device Chat - pi-kitchen");
    }

    #[test]
    fn chat_omits_absent_device_id_on_the_wire() {
        let json = serde_json::to_value(Chat::new("Test")).unwrap();
        assert!(json.get("device_id").is_none());
    }

    #[test]
    fn message_with_explicit_id_keeps_it() {
        let msg = Message::with_id("msg_x".into(), "chat_1", Role::Assistant, "hi");
        assert_eq!(msg.id, "msg_x");
        assert_eq!(msg.chat_id, "chat_1");
    }

    #[test]
    fn device_request_tolerates_minimal_body() {
        let req: DeviceRequest = serde_json::from_str(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(req.message, "hello");
        assert!(req.conversation.is_empty());
        assert!(!req.device_test);
    }

    #[test]
    fn device_request_parses_conversation() {
        let req: DeviceRequest = serde_json::from_str(
            r#"{"message":"hi","conversation":[{"role":"user","content":"earlier"}]}"#,
        )
        .unwrap();
        assert_eq!(req.conversation.len(), 1);
        assert_eq!(req.conversation[0].role, Role::User);
    }

    #[test]
    fn device_response_wire_shape() {
        let resp = DeviceResponse::new("ok", "chat_1", "msg_1");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["response"], "ok");
        assert_eq!(json["conversation_id"], "chat_1");
        assert_eq!(json["message_id"], "msg_1");
        assert!(json["timestamp"].is_string());
    }
}
