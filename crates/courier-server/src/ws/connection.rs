//! WebSocket session lifecycle — one connected client from upgrade
//! through disconnect.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use courier_core::envelope::normalize;
use courier_core::frame::OutboundFrame;
use courier_core::ids;
use courier_settings::CourierSettings;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::handlers::HandlerContext;
use crate::metrics::{WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL};
use crate::ws::dispatch::Dispatcher;
use crate::ws::registry::{ClientConnection, OUTBOUND_CAPACITY};

/// Whether a connect attempt may proceed.
///
/// The `development` environment accepts unauthenticated connects; every
/// other environment requires the presented token to equal a configured,
/// non-empty shared secret.
pub fn authorize(settings: &CourierSettings, token: Option<&str>) -> bool {
    if settings.server.environment == "development" {
        return true;
    }
    let expected = settings.server.api_token.as_str();
    !expected.is_empty() && token == Some(expected)
}

/// Run one WebSocket session to completion.
///
/// 1. Registers the connection with the registry
/// 2. Forwards queued outbound frames to the socket
/// 3. Decodes incoming text frames and dispatches them as commands
/// 4. Unregisters on disconnect
#[instrument(skip_all)]
pub async fn run_session(ws: WebSocket, dispatcher: Arc<Dispatcher>, ctx: Arc<HandlerContext>) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let connection_id = ids::connection_id();
    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(OUTBOUND_CAPACITY);
    let connection = Arc::new(ClientConnection::new(connection_id.clone(), send_tx));

    info!(connection_id, "client connected");
    metrics::counter!(WS_CONNECTIONS_TOTAL).increment(1);
    ctx.registry.register(connection.clone()).await;

    // Outbound forwarder: drains the connection's queue onto the socket.
    let outbound = tokio::spawn(async move {
        while let Some(text) = send_rx.recv().await {
            if ws_tx
                .send(Message::Text(text.as_str().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_string()),
                Err(_) => {
                    debug!(connection_id, len = data.len(), "dropping non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!(connection_id, "client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => None,
        };
        let Some(text) = text else { continue };

        let reply = handle_text(&text, &connection_id, &dispatcher, &ctx).await;
        if let Some(frame) = reply {
            ctx.registry.unicast(&connection_id, &frame).await;
        }
    }

    info!(connection_id, "client disconnected");
    metrics::counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    outbound.abort();
    ctx.registry.unregister(&connection_id).await;
}

/// Decode and dispatch one inbound text frame.
///
/// Every failure — unparsable JSON, malformed envelope, unknown action,
/// handler error — maps to exactly one error frame; the connection
/// always stays open.
async fn handle_text(
    text: &str,
    connection_id: &str,
    dispatcher: &Dispatcher,
    ctx: &HandlerContext,
) -> Option<OutboundFrame> {
    let raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(connection_id, error = %e, "unparsable frame");
            return Some(OutboundFrame::error("Invalid JSON payload"));
        }
    };
    let command = match normalize(raw) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(connection_id, error = %e, "malformed envelope");
            return Some(OutboundFrame::error(e.to_string()));
        }
    };
    debug!(connection_id, action = %command.action, "dispatching command");
    dispatcher.dispatch(&command, connection_id, ctx).await
}
