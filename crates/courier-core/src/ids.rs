//! Prefixed identifier helpers.
//!
//! All IDs in courier are opaque strings. Prefixes make log lines and raw
//! database rows self-describing.

use uuid::Uuid;

/// Fresh chat identifier.
pub fn chat_id() -> String {
    format!("chat_{}", Uuid::new_v4())
}

/// Fresh message identifier.
pub fn message_id() -> String {
    format!("msg_{}", Uuid::new_v4())
}

/// Fresh trace identifier correlating the frames of one assistant reply.
///
/// The persisted assistant message reuses this as its message ID so that
/// the ID a client displayed while streaming matches the stored row.
pub fn trace_id() -> String {
    format!("msg_{}", Uuid::new_v4())
}

/// Fresh connection identifier assigned by the registry.
pub fn connection_id() -> String {
    format!("conn_{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefixes() {
        assert!(chat_id().starts_with("chat_"));
        assert!(message_id().starts_with("msg_"));
        assert!(trace_id().starts_with("msg_"));
        assert!(connection_id().starts_with("conn_"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(chat_id(), chat_id());
        assert_ne!(trace_id(), trace_id());
    }
}
