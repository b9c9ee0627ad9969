//! End-to-end chat flow over the dispatcher: create a chat, send a
//! message, read the history back.

use std::sync::Arc;

use async_trait::async_trait;
use courier_core::envelope::{Command, normalize};
use courier_core::frame::OutboundFrame;
use courier_core::model::PromptMessage;
use courier_llm::{
    CompletionEvent, CompletionProvider, CompletionStream, ProviderResult,
};
use courier_server::handlers::{HandlerContext, register_default_handlers};
use courier_server::ws::dispatch::Dispatcher;
use courier_server::ws::registry::{ClientConnection, ConnectionRegistry};
use courier_settings::CourierSettings;
use courier_store::Store;
use serde_json::json;
use tokio::sync::mpsc;

struct CannedProvider {
    parts: Vec<&'static str>,
}

#[async_trait]
impl CompletionProvider for CannedProvider {
    fn model(&self) -> &str {
        "canned"
    }

    async fn stream(&self, _messages: &[PromptMessage]) -> ProviderResult<CompletionStream> {
        let parts: Vec<String> = self.parts.iter().map(ToString::to_string).collect();
        Ok(Box::pin(async_stream::stream! {
            for text in parts {
                yield Ok(CompletionEvent::Delta { text });
            }
            yield Ok(CompletionEvent::Done);
        }))
    }
}

struct Harness {
    ctx: HandlerContext,
    dispatcher: Dispatcher,
    rx: mpsc::Receiver<Arc<String>>,
    _dir: tempfile::TempDir,
}

async fn harness(parts: Vec<&'static str>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("flow.db")).unwrap();
    let registry = Arc::new(ConnectionRegistry::new());
    let (tx, rx) = mpsc::channel(128);
    registry
        .register(Arc::new(ClientConnection::new("client".into(), tx)))
        .await;

    let ctx = HandlerContext {
        settings: Arc::new(CourierSettings::default()),
        store: Arc::new(store),
        provider: Arc::new(CannedProvider { parts }),
        registry,
    };
    let mut dispatcher = Dispatcher::new();
    register_default_handlers(&mut dispatcher);
    Harness {
        ctx,
        dispatcher,
        rx,
        _dir: dir,
    }
}

fn command(value: serde_json::Value) -> Command {
    normalize(value).unwrap()
}

fn drain(rx: &mut mpsc::Receiver<Arc<String>>) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        frames.push(serde_json::from_str(&msg).unwrap());
    }
    frames
}

#[tokio::test]
async fn create_send_and_read_back() {
    let mut h = harness(vec!["Of ", "course", "!"]).await;

    // CREATE_CHAT echoes the name on a fresh inactive chat.
    let reply = h
        .dispatcher
        .dispatch(
            &command(json!({"type": "CREATE_CHAT", "name": "Trip planning"})),
            "client",
            &h.ctx,
        )
        .await;
    let Some(OutboundFrame::NewChat { chat }) = reply else {
        panic!("expected NEW_CHAT");
    };
    assert_eq!(chat.name, "Trip planning");
    assert!(!chat.active);
    assert!(chat.id.starts_with("chat_"));

    // SEND_MESSAGE streams the reply; no direct reply frame.
    let reply = h
        .dispatcher
        .dispatch(
            &command(json!({
                "type": "SEND_MESSAGE",
                "chatId": chat.id,
                "message": {"content": "Can you help?"},
            })),
            "client",
            &h.ctx,
        )
        .await;
    assert!(reply.is_none());

    // Reassembling the MESSAGE frames yields the full text, with exactly
    // one terminal frame at the end.
    let frames = drain(&mut h.rx);
    assert!(frames.iter().all(|f| f["type"] == "MESSAGE"));
    assert!(!frames.is_empty());
    let text: String = frames
        .iter()
        .map(|f| f["content"].as_str().unwrap())
        .collect();
    assert_eq!(text, "Of course!");
    let terminal_count = frames.iter().filter(|f| f["end"] == true).count();
    assert_eq!(terminal_count, 1);
    assert_eq!(frames.last().unwrap()["end"], true);
    let trace_id = frames[0]["traceId"].as_str().unwrap().to_string();
    assert!(frames.iter().all(|f| f["traceId"] == trace_id.as_str()));

    // History holds [user, assistant] in order.
    let reply = h
        .dispatcher
        .dispatch(
            &command(json!({"type": "GET_CHAT_HISTORY", "chatId": chat.id})),
            "client",
            &h.ctx,
        )
        .await;
    let Some(OutboundFrame::ChatHistory { messages }) = reply else {
        panic!("expected CHAT_HISTORY");
    };
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Can you help?");
    assert_eq!(messages[1].content, "Of course!");
    assert_eq!(messages[1].id, trace_id);
}

#[tokio::test]
async fn delete_chat_empties_history() {
    let mut h = harness(vec!["reply"]).await;

    let Some(OutboundFrame::NewChat { chat }) = h
        .dispatcher
        .dispatch(&command(json!({"type": "CREATE_CHAT"})), "client", &h.ctx)
        .await
    else {
        panic!("expected NEW_CHAT");
    };
    let _ = h
        .dispatcher
        .dispatch(
            &command(json!({
                "type": "SEND_MESSAGE",
                "chatId": chat.id,
                "message": {"content": "hello"},
            })),
            "client",
            &h.ctx,
        )
        .await;
    let _ = drain(&mut h.rx);

    let reply = h
        .dispatcher
        .dispatch(
            &command(json!({"type": "DELETE_CHAT", "chatId": chat.id})),
            "client",
            &h.ctx,
        )
        .await;
    assert!(matches!(reply, Some(OutboundFrame::ChatDeleted { .. })));

    let reply = h
        .dispatcher
        .dispatch(
            &command(json!({"type": "GET_CHAT_HISTORY", "chatId": chat.id})),
            "client",
            &h.ctx,
        )
        .await;
    let Some(OutboundFrame::ChatHistory { messages }) = reply else {
        panic!("expected CHAT_HISTORY");
    };
    assert!(messages.is_empty());

    let reply = h
        .dispatcher
        .dispatch(&command(json!({"type": "GET_CHATS"})), "client", &h.ctx)
        .await;
    let Some(OutboundFrame::ChatList { chats }) = reply else {
        panic!("expected CHAT_LIST");
    };
    assert!(chats.is_empty());
}
