//! Handlers for chat lifecycle actions.

use async_trait::async_trait;
use chrono::Utc;
use courier_core::envelope::Command;
use courier_core::error::RelayError;
use courier_core::frame::OutboundFrame;
use courier_core::model::Chat;
use tracing::info;

use super::HandlerContext;
use crate::ws::dispatch::ActionHandler;

/// `GET_CHATS` — list every chat, newest first.
pub struct GetChatsHandler;

#[async_trait]
impl ActionHandler for GetChatsHandler {
    async fn handle(
        &self,
        _command: &Command,
        _connection_id: &str,
        ctx: &HandlerContext,
    ) -> Result<Option<OutboundFrame>, RelayError> {
        let chats = ctx.store.list_chats().map_err(RelayError::store)?;
        Ok(Some(OutboundFrame::ChatList { chats }))
    }
}

/// `CREATE_CHAT` — create a chat, defaulting the name to a timestamp.
pub struct CreateChatHandler;

#[async_trait]
impl ActionHandler for CreateChatHandler {
    async fn handle(
        &self,
        command: &Command,
        connection_id: &str,
        ctx: &HandlerContext,
    ) -> Result<Option<OutboundFrame>, RelayError> {
        let name = match command.str_field("name") {
            Some(name) => name.to_string(),
            None => format!("Chat {}", Utc::now().format("%Y-%m-%d %H:%M")),
        };
        let chat = Chat::new(name);
        ctx.store.put_chat(&chat).map_err(RelayError::store)?;
        info!(chat_id = %chat.id, connection_id, "chat created");
        Ok(Some(OutboundFrame::NewChat { chat }))
    }
}

/// `GET_CHAT_HISTORY` — all messages of one chat, oldest first.
pub struct GetChatHistoryHandler;

#[async_trait]
impl ActionHandler for GetChatHistoryHandler {
    async fn handle(
        &self,
        command: &Command,
        _connection_id: &str,
        ctx: &HandlerContext,
    ) -> Result<Option<OutboundFrame>, RelayError> {
        let chat_id = command
            .str_field("chatId")
            .ok_or_else(|| RelayError::ClientInput("Chat ID is required".to_string()))?;
        let messages = ctx
            .store
            .chat_messages(chat_id)
            .map_err(RelayError::store)?;
        Ok(Some(OutboundFrame::ChatHistory { messages }))
    }
}

/// `DELETE_CHAT` — remove a chat and its messages.
pub struct DeleteChatHandler;

#[async_trait]
impl ActionHandler for DeleteChatHandler {
    async fn handle(
        &self,
        command: &Command,
        connection_id: &str,
        ctx: &HandlerContext,
    ) -> Result<Option<OutboundFrame>, RelayError> {
        let chat_id = command
            .str_field("chatId")
            .ok_or_else(|| RelayError::ClientInput("Chat ID is required".to_string()))?;
        let existed = ctx.store.delete_chat(chat_id).map_err(RelayError::store)?;
        info!(chat_id, connection_id, existed, "chat deleted");
        Ok(Some(OutboundFrame::ChatDeleted {
            chat_id: chat_id.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::envelope::normalize;
    use courier_core::model::{Message, Role};
    use serde_json::json;

    use crate::handlers::test_support::test_context;

    fn command(value: serde_json::Value) -> Command {
        normalize(value).unwrap()
    }

    #[tokio::test]
    async fn get_chats_lists_newest_first() {
        let (ctx, _dir) = test_context();
        let mut a = Chat::new("older");
        a.created_at = "2026-08-01T00:00:00+00:00".into();
        let mut b = Chat::new("newer");
        b.created_at = "2026-08-02T00:00:00+00:00".into();
        ctx.store.put_chat(&a).unwrap();
        ctx.store.put_chat(&b).unwrap();

        let reply = GetChatsHandler
            .handle(&command(json!({"type": "GET_CHATS"})), "c1", &ctx)
            .await
            .unwrap();
        match reply.unwrap() {
            OutboundFrame::ChatList { chats } => {
                assert_eq!(chats.len(), 2);
                assert_eq!(chats[0].name, "newer");
                assert_eq!(chats[1].name, "older");
            }
            other => panic!("expected CHAT_LIST, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_chats_empty_store() {
        let (ctx, _dir) = test_context();
        let reply = GetChatsHandler
            .handle(&command(json!({"type": "GET_CHATS"})), "c1", &ctx)
            .await
            .unwrap();
        match reply.unwrap() {
            OutboundFrame::ChatList { chats } => assert!(chats.is_empty()),
            other => panic!("expected CHAT_LIST, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_chat_uses_supplied_name() {
        let (ctx, _dir) = test_context();
        let reply = CreateChatHandler
            .handle(
                &command(json!({"type": "CREATE_CHAT", "name": "Groceries"})),
                "c1",
                &ctx,
            )
            .await
            .unwrap();
        let OutboundFrame::NewChat { chat } = reply.unwrap() else {
            panic!("expected NEW_CHAT");
        };
        assert_eq!(chat.name, "Groceries");
        assert!(!chat.active);
        assert!(ctx.store.get_chat(&chat.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn create_chat_defaults_name_to_timestamp() {
        let (ctx, _dir) = test_context();
        let reply = CreateChatHandler
            .handle(&command(json!({"type": "CREATE_CHAT"})), "c1", &ctx)
            .await
            .unwrap();
        let OutboundFrame::NewChat { chat } = reply.unwrap() else {
            panic!("expected NEW_CHAT");
        };
        // "Chat YYYY-MM-DD HH:MM"
        assert!(chat.name.starts_with("Chat 2"), "name: {}", chat.name);
        assert_eq!(chat.name.len(), "Chat 2026-08-29 12:00".len());
    }

    #[tokio::test]
    async fn history_requires_chat_id() {
        let (ctx, _dir) = test_context();
        let err = GetChatHistoryHandler
            .handle(&command(json!({"type": "GET_CHAT_HISTORY"})), "c1", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Chat ID is required");
    }

    #[tokio::test]
    async fn history_returns_messages_oldest_first() {
        let (ctx, _dir) = test_context();
        let chat = Chat::new("c");
        ctx.store.put_chat(&chat).unwrap();
        let mut first = Message::new(&chat.id, Role::User, "hi");
        first.created_at = "2026-08-01T00:00:00+00:00".into();
        let mut second = Message::new(&chat.id, Role::Assistant, "hello");
        second.created_at = "2026-08-01T00:00:01+00:00".into();
        ctx.store.add_message(&second).unwrap();
        ctx.store.add_message(&first).unwrap();

        let reply = GetChatHistoryHandler
            .handle(
                &command(json!({"type": "GET_CHAT_HISTORY", "chatId": chat.id})),
                "c1",
                &ctx,
            )
            .await
            .unwrap();
        let OutboundFrame::ChatHistory { messages } = reply.unwrap() else {
            panic!("expected CHAT_HISTORY");
        };
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn history_of_unknown_chat_is_empty() {
        let (ctx, _dir) = test_context();
        let reply = GetChatHistoryHandler
            .handle(
                &command(json!({"type": "GET_CHAT_HISTORY", "chatId": "chat_ghost"})),
                "c1",
                &ctx,
            )
            .await
            .unwrap();
        let OutboundFrame::ChatHistory { messages } = reply.unwrap() else {
            panic!("expected CHAT_HISTORY");
        };
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn delete_chat_removes_chat_and_messages() {
        let (ctx, _dir) = test_context();
        let chat = Chat::new("doomed");
        ctx.store.put_chat(&chat).unwrap();
        ctx.store
            .add_message(&Message::new(&chat.id, Role::User, "bye"))
            .unwrap();

        let reply = DeleteChatHandler
            .handle(
                &command(json!({"type": "DELETE_CHAT", "chatId": chat.id})),
                "c1",
                &ctx,
            )
            .await
            .unwrap();
        let OutboundFrame::ChatDeleted { chat_id } = reply.unwrap() else {
            panic!("expected CHAT_DELETED");
        };
        assert_eq!(chat_id, chat.id);
        assert!(ctx.store.get_chat(&chat.id).unwrap().is_none());
        assert!(ctx.store.chat_messages(&chat.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_chat_still_acknowledges() {
        let (ctx, _dir) = test_context();
        let reply = DeleteChatHandler
            .handle(
                &command(json!({"type": "DELETE_CHAT", "chatId": "chat_ghost"})),
                "c1",
                &ctx,
            )
            .await
            .unwrap();
        let OutboundFrame::ChatDeleted { chat_id } = reply.unwrap() else {
            panic!("expected CHAT_DELETED");
        };
        assert_eq!(chat_id, "chat_ghost");
    }

    #[tokio::test]
    async fn delete_requires_chat_id() {
        let (ctx, _dir) = test_context();
        let err = DeleteChatHandler
            .handle(&command(json!({"type": "DELETE_CHAT"})), "c1", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Chat ID is required");
    }
}
