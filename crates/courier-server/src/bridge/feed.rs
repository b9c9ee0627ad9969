//! Feed abstraction the bridge consumes events from.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

/// One inbound device event.
#[derive(Clone, Debug, Deserialize)]
pub struct FeedEvent {
    /// Upstream delivery ID; events without one skip the dedup gate.
    #[serde(default)]
    pub delivery_id: Option<String>,
    /// Originating device.
    pub device_id: String,
    /// Raw JSON body, decoded later into a `DeviceRequest`.
    pub body: serde_json::Value,
}

/// Source of device events.
///
/// `next` yields events until the feed is exhausted; `checkpoint` tells the
/// feed an event needs no redelivery. A feed that redelivers between
/// checkpoints is fine — the dedup ledger absorbs replays.
#[async_trait]
pub trait EventFeed: Send {
    /// Next event, or `None` when the feed has closed.
    async fn next(&mut self) -> Option<FeedEvent>;

    /// Acknowledge an event as fully handled.
    async fn checkpoint(&mut self, event: &FeedEvent);
}

/// In-process feed backed by a bounded channel.
///
/// The ingest route pushes decoded events into the sender half; channel
/// delivery is at-most-once, so `checkpoint` is a no-op.
pub struct ChannelFeed {
    rx: mpsc::Receiver<FeedEvent>,
}

/// Build a channel feed, returning the ingest sender and the feed.
pub fn channel_feed(capacity: usize) -> (mpsc::Sender<FeedEvent>, ChannelFeed) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ChannelFeed { rx })
}

#[async_trait]
impl EventFeed for ChannelFeed {
    async fn next(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    async fn checkpoint(&mut self, _event: &FeedEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn channel_feed_yields_in_order_then_closes() {
        let (tx, mut feed) = channel_feed(8);
        for i in 0..3 {
            tx.send(FeedEvent {
                delivery_id: Some(format!("d{i}")),
                device_id: "pi-1".into(),
                body: json!({"message": format!("m{i}")}),
            })
            .await
            .unwrap();
        }
        drop(tx);

        for i in 0..3 {
            let event = feed.next().await.unwrap();
            assert_eq!(event.delivery_id.as_deref(), Some(format!("d{i}").as_str()));
        }
        assert!(feed.next().await.is_none());
    }

    #[test]
    fn feed_event_decodes_with_optional_delivery_id() {
        let event: FeedEvent = serde_json::from_value(json!({
            "device_id": "pi-1",
            "body": {"message": "hi"},
        }))
        .unwrap();
        assert!(event.delivery_id.is_none());
        assert_eq!(event.device_id, "pi-1");
        assert_eq!(event.body["message"], "hi");
    }
}
