//! HTTP surface: WebSocket upgrade, health, metrics, and bridge ingest.

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{CloseFrame, Message, close_code};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::bridge::feed::FeedEvent;
use crate::handlers::HandlerContext;
use crate::ws::connection::{authorize, run_session};
use crate::ws::dispatch::Dispatcher;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handler context (settings, store, provider, registry).
    pub ctx: Arc<HandlerContext>,
    /// Immutable action routing table.
    pub dispatcher: Arc<Dispatcher>,
    /// Renders the Prometheus exposition text.
    pub metrics: PrometheusHandle,
    /// Bridge ingest sender; `None` when the bridge is disabled.
    pub ingest: Option<mpsc::Sender<FeedEvent>>,
}

/// Build the router over shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/events", post(ingest_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// GET /ws — upgrade, then run the session; unauthorized connects are
/// closed with a policy-violation code after the upgrade completes.
async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let authorized = authorize(&state.ctx.settings, query.token.as_deref());
    ws.on_upgrade(move |mut socket| async move {
        if !authorized {
            warn!("rejecting unauthenticated websocket connect");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "Unauthorized".into(),
                })))
                .await;
            return;
        }
        run_session(socket, state.dispatcher, state.ctx).await;
    })
}

/// GET /healthz
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

/// GET /metrics — Prometheus exposition text.
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// POST /events — push one device event onto the bridge feed.
async fn ingest_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<FeedEvent>,
) -> Response {
    let token = headers.get("X-API-Key").and_then(|v| v.to_str().ok());
    if !authorize(&state.ctx.settings, token) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(ingest) = &state.ingest else {
        return (StatusCode::SERVICE_UNAVAILABLE, "bridge is disabled").into_response();
    };
    match ingest.try_send(event) {
        Ok(()) => {
            info!("event accepted for bridge processing");
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => {
            warn!(error = %e, "bridge feed is not accepting events");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
