//! Outbound frames and replies — one tagged enum covering every JSON unit
//! the server writes to a connection.
//!
//! Streaming frames (`MESSAGE`, `FIRST_MESSAGE`) carry a trace ID that
//! correlates all chunks of one logical reply; the terminal chunk has
//! `end=true`. Replies (`CHAT_LIST` etc.) answer a single command. `ERROR`
//! is the only failure shape a client ever sees.

use serde::{Deserialize, Serialize};

use crate::model::{Chat, Message};

/// One outbound JSON unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    /// One chunk of a streamed assistant reply.
    #[serde(rename = "MESSAGE")]
    Message {
        /// Text fragment; empty on the terminal frame.
        content: String,
        /// Correlates all chunks of one reply.
        #[serde(rename = "traceId")]
        trace_id: String,
        /// Terminal-frame marker.
        end: bool,
    },

    /// Mirror of a device-originated user turn, broadcast to live viewers.
    #[serde(rename = "FIRST_MESSAGE")]
    FirstMessage {
        /// Full user text.
        content: String,
        /// Fresh trace ID for the mirrored turn.
        #[serde(rename = "traceId")]
        trace_id: String,
        /// Always `true`: the user turn arrives whole.
        end: bool,
    },

    /// Human-readable failure.
    #[serde(rename = "ERROR")]
    Error {
        /// What went wrong.
        error: String,
    },

    /// Reply to `GET_CHATS`.
    #[serde(rename = "CHAT_LIST")]
    ChatList {
        /// All chats, newest first.
        chats: Vec<Chat>,
    },

    /// Reply to `CREATE_CHAT`.
    #[serde(rename = "NEW_CHAT")]
    NewChat {
        /// The created chat.
        chat: Chat,
    },

    /// Reply to `GET_CHAT_HISTORY`.
    #[serde(rename = "CHAT_HISTORY")]
    ChatHistory {
        /// Messages in chronological order.
        messages: Vec<Message>,
    },

    /// Reply to `DELETE_CHAT`.
    #[serde(rename = "CHAT_DELETED")]
    ChatDeleted {
        /// The deleted chat's ID.
        #[serde(rename = "chatId")]
        chat_id: String,
    },
}

impl OutboundFrame {
    /// Non-terminal streaming chunk.
    pub fn chunk(trace_id: &str, content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
            trace_id: trace_id.to_string(),
            end: false,
        }
    }

    /// Terminal streaming frame (empty content, `end=true`).
    pub fn terminal(trace_id: &str) -> Self {
        Self::Message {
            content: String::new(),
            trace_id: trace_id.to_string(),
            end: true,
        }
    }

    /// Final chunk carrying the last remaining characters.
    pub fn last_chunk(trace_id: &str, content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
            trace_id: trace_id.to_string(),
            end: true,
        }
    }

    /// Mirrored user turn.
    pub fn first_message(trace_id: &str, content: impl Into<String>) -> Self {
        Self::FirstMessage {
            content: content.into(),
            trace_id: trace_id.to_string(),
            end: true,
        }
    }

    /// Error frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}
