//! External channel bridge: device events in, signed device pushes out,
//! with live-viewer mirroring and an idempotency ledger.

pub mod device;
pub mod feed;
pub mod sas;

use std::sync::Arc;
use std::time::Duration;

use courier_core::ids;
use courier_core::model::{Chat, DeviceRequest, DeviceResponse, Message, PromptMessage, Role};
use courier_llm::CompletionProvider;
use courier_settings::CourierSettings;
use courier_store::Store;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::{
    BRIDGE_DELIVERY_TIMEOUTS_TOTAL, BRIDGE_DUPLICATES_TOTAL, BRIDGE_EVENTS_TOTAL,
    LEDGER_PURGED_TOTAL,
};
use crate::relay;
use crate::ws::registry::ConnectionRegistry;

use self::device::DeviceChannel;
use self::feed::{EventFeed, FeedEvent};

/// Delay before retrying a failed cleanup sweep.
const CLEANUP_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Bridge-side failures.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Ledger or chat storage failed.
    #[error("store error: {0}")]
    Store(#[from] courier_store::StoreError),

    /// Token signing failed (bad key material).
    #[error("signing error: {0}")]
    Signing(String),

    /// The push to the device did not complete.
    #[error("delivery error: {0}")]
    Delivery(String),
}

/// How one feed event was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Full exchange: persisted, delivered, mirrored.
    Handled,
    /// Redelivery of an already-processed event.
    Duplicate,
    /// Body did not decode into a usable request.
    Skipped,
    /// Generation failed; the device got fallback text instead.
    GenerationFailed,
}

/// Orchestrates the device exchange pipeline.
pub struct Bridge {
    settings: Arc<CourierSettings>,
    store: Arc<Store>,
    provider: Arc<dyn CompletionProvider>,
    registry: Arc<ConnectionRegistry>,
    channel: Arc<dyn DeviceChannel>,
}

impl Bridge {
    /// Assemble a bridge over shared components.
    pub fn new(
        settings: Arc<CourierSettings>,
        store: Arc<Store>,
        provider: Arc<dyn CompletionProvider>,
        registry: Arc<ConnectionRegistry>,
        channel: Arc<dyn DeviceChannel>,
    ) -> Self {
        Self {
            settings,
            store,
            provider,
            registry,
            channel,
        }
    }

    /// Process one feed event end to end.
    ///
    /// `Ok` means the event needs no redelivery (handled, duplicate, or
    /// unusable); `Err` means a dependency failed before the exchange
    /// completed and the feed should not checkpoint.
    #[instrument(skip_all, fields(device_id = %event.device_id, delivery_id = ?event.delivery_id))]
    pub async fn handle_event(&self, event: &FeedEvent) -> Result<Outcome, BridgeError> {
        metrics::counter!(BRIDGE_EVENTS_TOTAL).increment(1);

        // Dedup gate: losing the insert race means a redelivery.
        if let Some(delivery_id) = &event.delivery_id {
            if !self.store.try_mark_processed(delivery_id, &event.device_id)? {
                debug!("redelivered event, skipping");
                metrics::counter!(BRIDGE_DUPLICATES_TOTAL).increment(1);
                return Ok(Outcome::Duplicate);
            }
        }

        let request: DeviceRequest = match serde_json::from_value(event.body.clone()) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "undecodable event body, skipping");
                return Ok(Outcome::Skipped);
            }
        };
        if request.message.is_empty() {
            warn!("event carried an empty message, skipping");
            return Ok(Outcome::Skipped);
        }
        // Feed metadata wins over the body's self-identification.
        let device_id = &event.device_id;

        let chat = self.resolve_chat(device_id)?;
        let user_turn = Message::new(&chat.id, Role::User, request.message.clone());
        self.store.add_message(&user_turn)?;

        let prompts = if request.conversation.is_empty() {
            self.store
                .chat_messages(&chat.id)?
                .iter()
                .map(|m| PromptMessage::new(m.role, m.content.clone()))
                .collect()
        } else {
            request.conversation.clone()
        };

        let trace_id = ids::trace_id();
        let generated = match self.generate(&prompts).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, chat_id = %chat.id, "generation failed for device exchange");
                let fallback = format!("Error processing your message: {e}");
                let response = DeviceResponse::new(fallback, &chat.id, &trace_id);
                self.deliver_bounded(device_id, &response).await;
                return Ok(Outcome::GenerationFailed);
            }
        };

        let assistant =
            Message::with_id(trace_id.clone(), &chat.id, Role::Assistant, generated.clone());
        self.store.add_message(&assistant)?;

        let response = DeviceResponse::new(generated.clone(), &chat.id, &assistant.id);
        self.deliver_bounded(device_id, &response).await;

        // Mirror the exchange to live viewers: the user turn whole, the
        // assistant turn paced like a live stream.
        self.registry
            .broadcast(&courier_core::frame::OutboundFrame::first_message(
                &user_turn.id,
                user_turn.content.clone(),
            ))
            .await;
        relay::broadcast_chunked(
            &self.registry,
            &trace_id,
            &generated,
            self.settings.bridge.mirror_chunk_size,
            Duration::from_millis(self.settings.bridge.mirror_chunk_delay_ms),
        )
        .await;

        info!(chat_id = %chat.id, trace_id, "device exchange complete");
        Ok(Outcome::Handled)
    }

    /// Active chat bound to the device, or a fresh one.
    fn resolve_chat(&self, device_id: &str) -> Result<Chat, BridgeError> {
        if let Some(chat) = self.store.find_active_device_chat(device_id)? {
            return Ok(chat);
        }
        let chat = Chat::for_device(device_id);
        self.store.put_chat(&chat)?;
        info!(chat_id = %chat.id, device_id, "created device chat");
        Ok(chat)
    }

    async fn generate(&self, prompts: &[PromptMessage]) -> Result<String, courier_llm::ProviderError> {
        let stream = self.provider.stream(prompts).await?;
        relay::accumulate(stream).await
    }

    /// Deliver within the configured bound; a timeout or failure is logged
    /// and the exchange continues, so a dead device never wedges the feed.
    async fn deliver_bounded(&self, device_id: &str, response: &DeviceResponse) {
        let bound = Duration::from_secs(self.settings.bridge.device_timeout_secs);
        match tokio::time::timeout(bound, self.channel.deliver(device_id, response)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(device_id, error = %e, "device delivery failed"),
            Err(_) => {
                warn!(device_id, timeout_secs = bound.as_secs(), "device delivery timed out");
                metrics::counter!(BRIDGE_DELIVERY_TIMEOUTS_TOTAL).increment(1);
            }
        }
    }

    /// Consume a feed until it closes, checkpointing every event that
    /// needs no redelivery.
    pub async fn run(&self, mut feed: impl EventFeed) {
        info!("bridge consuming feed");
        while let Some(event) = feed.next().await {
            match self.handle_event(&event).await {
                Ok(outcome) => {
                    debug!(?outcome, "event resolved");
                    feed.checkpoint(&event).await;
                }
                Err(e) => {
                    // No checkpoint: the feed may redeliver; the ledger
                    // absorbs the replay once the dependency recovers.
                    error!(error = %e, "event processing failed");
                }
            }
        }
        info!("feed closed, bridge stopping");
    }
}

/// Periodic ledger cleanup sweep.
pub async fn run_cleanup(store: Arc<Store>, retention_days: i64, interval: Duration) {
    info!(retention_days, interval_secs = interval.as_secs(), "ledger cleanup running");
    loop {
        match store.purge_processed_older_than(retention_days) {
            Ok(purged) => {
                if purged > 0 {
                    info!(purged, "ledger sweep removed expired rows");
                    metrics::counter!(LEDGER_PURGED_TOTAL).increment(purged as u64);
                }
                tokio::time::sleep(interval).await;
            }
            Err(e) => {
                warn!(error = %e, "ledger sweep failed, retrying shortly");
                tokio::time::sleep(CLEANUP_RETRY_DELAY).await;
            }
        }
    }
}

/// Handles to the bridge's background tasks.
pub struct BridgeHandle {
    consume: JoinHandle<()>,
    cleanup: JoinHandle<()>,
}

impl BridgeHandle {
    /// Spawn the feed consumer and the cleanup sweep.
    pub fn spawn(bridge: Arc<Bridge>, feed: impl EventFeed + 'static) -> Self {
        let store = bridge.store.clone();
        let retention_days = bridge.settings.bridge.retention_days;
        let interval = Duration::from_secs(bridge.settings.bridge.cleanup_interval_secs);
        let consume = tokio::spawn(async move { bridge.run(feed).await });
        let cleanup = tokio::spawn(run_cleanup(store, retention_days, interval));
        Self { consume, cleanup }
    }

    /// Cancel both tasks and wait them out.
    pub async fn shutdown(self) {
        self.consume.abort();
        self.cleanup.abort();
        let _ = self.consume.await;
        let _ = self.cleanup.await;
    }
}
