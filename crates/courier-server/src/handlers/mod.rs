//! Chat action handlers and their shared context.

pub mod chat;
pub mod message;

use std::sync::Arc;

use courier_llm::CompletionProvider;
use courier_settings::CourierSettings;
use courier_store::Store;

use crate::ws::dispatch::Dispatcher;
use crate::ws::registry::ConnectionRegistry;

/// Everything a handler needs, shared across connections.
pub struct HandlerContext {
    /// Settings snapshot taken at startup.
    pub settings: Arc<CourierSettings>,
    /// Chat, message, and ledger storage.
    pub store: Arc<Store>,
    /// Streaming completion backend.
    pub provider: Arc<dyn CompletionProvider>,
    /// Live connection registry, for streaming replies.
    pub registry: Arc<ConnectionRegistry>,
}

/// Bind the built-in chat actions.
pub fn register_default_handlers(dispatcher: &mut Dispatcher) {
    dispatcher.register("GET_CHATS", Arc::new(chat::GetChatsHandler));
    dispatcher.register("CREATE_CHAT", Arc::new(chat::CreateChatHandler));
    dispatcher.register("GET_CHAT_HISTORY", Arc::new(chat::GetChatHistoryHandler));
    dispatcher.register("DELETE_CHAT", Arc::new(chat::DeleteChatHandler));
    dispatcher.register("SEND_MESSAGE", Arc::new(message::SendMessageHandler));
}
