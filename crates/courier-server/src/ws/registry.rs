//! Frame fan-out to connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use courier_core::frame::OutboundFrame;
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::{WS_FRAMES_SENT_TOTAL, WS_PRUNES_TOTAL};

/// Outbound channel capacity per connection. A client that falls this
/// far behind is considered dead and gets pruned.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Represents a connected WebSocket client.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: String,
    /// Send channel to the client's WebSocket write task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Count of frames dropped due to a full or closed channel.
    pub dropped_frames: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            connected_at: Instant::now(),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Send a serialized frame to the client.
    ///
    /// Returns `false` if the channel is full or closed, and increments
    /// the dropped frame counter.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }
}

/// Tracks live connections and routes frames to one or all of them.
///
/// Sends never fail from the caller's point of view: a connection whose
/// channel is full or closed is pruned from the registry instead.
pub struct ConnectionRegistry {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection. A second registration under the same ID
    /// replaces the first.
    pub async fn register(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
        metrics::gauge!(crate::metrics::WS_CONNECTIONS_ACTIVE).set(conns.len() as f64);
    }

    /// Remove a connection by ID. Unknown IDs are a no-op.
    pub async fn unregister(&self, connection_id: &str) {
        let mut conns = self.connections.write().await;
        let _ = conns.remove(connection_id);
        metrics::gauge!(crate::metrics::WS_CONNECTIONS_ACTIVE).set(conns.len() as f64);
    }

    /// Number of live connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a frame to one connection. Unknown IDs are a no-op.
    pub async fn unicast(&self, connection_id: &str, frame: &OutboundFrame) {
        let Some(json) = serialize(frame) else { return };
        let failed = {
            let conns = self.connections.read().await;
            match conns.get(connection_id) {
                Some(conn) if conn.send(json) => {
                    metrics::counter!(WS_FRAMES_SENT_TOTAL).increment(1);
                    return;
                }
                Some(_) => true,
                None => {
                    debug!(connection_id, "unicast to unknown connection");
                    return;
                }
            }
        };
        if failed {
            self.prune(connection_id).await;
        }
    }

    /// Send a frame to every connection.
    pub async fn broadcast(&self, frame: &OutboundFrame) {
        let Some(json) = serialize(frame) else { return };
        let mut stale = Vec::new();
        {
            let conns = self.connections.read().await;
            debug!(recipients = conns.len(), "broadcast frame");
            for conn in conns.values() {
                if conn.send(json.clone()) {
                    metrics::counter!(WS_FRAMES_SENT_TOTAL).increment(1);
                } else {
                    stale.push(conn.id.clone());
                }
            }
        }
        for id in stale {
            self.prune(&id).await;
        }
    }

    async fn prune(&self, connection_id: &str) {
        warn!(connection_id, "pruning unresponsive connection");
        metrics::counter!(WS_PRUNES_TOTAL).increment(1);
        self.unregister(connection_id).await;
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(frame: &OutboundFrame) -> Option<Arc<String>> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            warn!(error = %e, "failed to serialize outbound frame");
            None
        }
    }
}
