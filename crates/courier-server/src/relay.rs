//! Streaming relay: turns a completion stream into ordered `MESSAGE`
//! frames for one connection, or accumulates it for the device bridge.

use std::sync::Arc;
use std::time::Duration;

use courier_core::frame::OutboundFrame;
use courier_llm::{CompletionEvent, CompletionStream, ProviderError};
use futures::StreamExt;
use tracing::debug;

use crate::ws::registry::ConnectionRegistry;

/// Relay a completion stream to one connection as `MESSAGE` frames.
///
/// Every fragment goes out as a non-terminal chunk in arrival order; after
/// the backend signals completion, one terminal frame (`end=true`, empty
/// content) follows. Returns the accumulated full text.
///
/// On a mid-stream failure nothing further is sent — no terminal frame —
/// and the error propagates to the caller.
pub async fn stream_to_connection(
    registry: &ConnectionRegistry,
    connection_id: &str,
    mut stream: CompletionStream,
    trace_id: &str,
) -> Result<String, ProviderError> {
    let mut full = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            CompletionEvent::Delta { text } => {
                full.push_str(&text);
                registry
                    .unicast(connection_id, &OutboundFrame::chunk(trace_id, text))
                    .await;
            }
            CompletionEvent::Done => break,
        }
    }
    registry
        .unicast(connection_id, &OutboundFrame::terminal(trace_id))
        .await;
    debug!(connection_id, trace_id, chars = full.len(), "relay complete");
    Ok(full)
}

/// Drain a completion stream into its full text without emitting frames.
///
/// The bridge uses this: a device wants the finished reply, not chunks.
pub async fn accumulate(mut stream: CompletionStream) -> Result<String, ProviderError> {
    let mut full = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            CompletionEvent::Delta { text } => full.push_str(&text),
            CompletionEvent::Done => break,
        }
    }
    Ok(full)
}

/// Broadcast already-complete text to every connection as a chunked
/// `MESSAGE` sequence, pacing chunks by `delay` to read like a live stream.
///
/// Chunks split on character boundaries. The final chunk carries
/// `end=true`; empty text degenerates to a single terminal frame.
pub async fn broadcast_chunked(
    registry: &Arc<ConnectionRegistry>,
    trace_id: &str,
    text: &str,
    chunk_size: usize,
    delay: Duration,
) {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        registry.broadcast(&OutboundFrame::terminal(trace_id)).await;
        return;
    }
    let size = chunk_size.max(1);
    let mut pieces = chars.chunks(size).peekable();
    while let Some(piece) = pieces.next() {
        let content: String = piece.iter().collect();
        let frame = if pieces.peek().is_none() {
            OutboundFrame::last_chunk(trace_id, content)
        } else {
            OutboundFrame::chunk(trace_id, content)
        };
        registry.broadcast(&frame).await;
        if pieces.peek().is_some() {
            tokio::time::sleep(delay).await;
        }
    }
}
