//! `SEND_MESSAGE`: persist the user turn, stream the assistant reply.

use async_trait::async_trait;
use courier_core::envelope::Command;
use courier_core::error::RelayError;
use courier_core::frame::OutboundFrame;
use courier_core::ids;
use courier_core::model::{Message, PromptMessage, Role};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::HandlerContext;
use crate::metrics::{PROVIDER_ERRORS_TOTAL, PROVIDER_REQUESTS_TOTAL};
use crate::relay;
use crate::ws::dispatch::ActionHandler;

/// `SEND_MESSAGE` — append a user turn and relay the streamed reply back
/// to the issuing connection.
///
/// The reply travels as `MESSAGE` frames, so the handler returns no reply
/// frame of its own. A generation failure surfaces as a single `ERROR`
/// frame (via the dispatcher) with no terminal frame; the assistant turn
/// is only persisted once the full text has arrived.
pub struct SendMessageHandler;

#[async_trait]
impl ActionHandler for SendMessageHandler {
    #[instrument(skip_all, fields(connection_id = %connection_id))]
    async fn handle(
        &self,
        command: &Command,
        connection_id: &str,
        ctx: &HandlerContext,
    ) -> Result<Option<OutboundFrame>, RelayError> {
        let (chat_id, content, message_id) = parse_payload(command)?;

        let user_turn = match message_id {
            Some(id) => Message::with_id(id, chat_id, Role::User, content),
            None => Message::new(chat_id, Role::User, content),
        };
        ctx.store.add_message(&user_turn).map_err(RelayError::store)?;

        let history = ctx
            .store
            .chat_messages(chat_id)
            .map_err(RelayError::store)?;
        let prompts: Vec<PromptMessage> = history
            .iter()
            .map(|m| PromptMessage::new(m.role, m.content.clone()))
            .collect();

        metrics::counter!(PROVIDER_REQUESTS_TOTAL).increment(1);
        let trace_id = ids::trace_id();
        let stream = ctx.provider.stream(&prompts).await.map_err(|e| {
            metrics::counter!(PROVIDER_ERRORS_TOTAL).increment(1);
            RelayError::provider(e)
        })?;

        match relay::stream_to_connection(&ctx.registry, connection_id, stream, &trace_id).await {
            Ok(full) => {
                let assistant =
                    Message::with_id(trace_id.clone(), chat_id, Role::Assistant, full);
                ctx.store.add_message(&assistant).map_err(RelayError::store)?;
                info!(chat_id, trace_id, "exchange complete");
                Ok(None)
            }
            Err(e) => {
                metrics::counter!(PROVIDER_ERRORS_TOTAL).increment(1);
                warn!(chat_id, trace_id, error = %e, "generation failed mid-stream");
                Err(RelayError::provider(e))
            }
        }
    }
}

/// Extract `(chat_id, content, message_id)` from the payload.
///
/// `message` may be an object (`{"content": ..., "id": ...}`) or a bare
/// string. A missing chat ID or empty content is one client-input error.
fn parse_payload(command: &Command) -> Result<(&str, &str, Option<String>), RelayError> {
    let missing = || RelayError::ClientInput("Chat ID and message are required".to_string());

    let chat_id = command.str_field("chatId").ok_or_else(missing)?;
    let (content, message_id) = match command.payload.get("message") {
        Some(Value::String(s)) => (s.as_str(), None),
        Some(Value::Object(obj)) => {
            let content = obj
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(missing)?;
            let id = obj
                .get("id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string);
            (content, id)
        }
        _ => return Err(missing()),
    };
    if content.is_empty() {
        return Err(missing());
    }
    Ok((chat_id, content, message_id))
}
