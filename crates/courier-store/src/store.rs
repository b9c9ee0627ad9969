//! High-level `Store` facade over the connection pool and repositories.
//!
//! Each method checks out one pooled connection. Multi-row writes (chat
//! delete) run inside a single transaction so callers never observe the
//! half-deleted state. Everything else is an independent document upsert.

use std::path::Path;

use chrono::{Duration, Utc};
use courier_core::model::{Chat, Message, ProcessedEvent};
use tracing::{debug, instrument};

use crate::connection::{ConnectionPool, open_pool};
use crate::errors::Result;
use crate::repositories::chat::ChatRepo;
use crate::repositories::message::MessageRepo;
use crate::repositories::processed_event::ProcessedEventRepo;

/// Document store for chats, messages, and the dedup ledger.
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            pool: open_pool(path)?,
        })
    }

    // ── Chats ───────────────────────────────────────────────────────────

    /// All chats, newest first.
    pub fn list_chats(&self) -> Result<Vec<Chat>> {
        let conn = self.pool.get()?;
        ChatRepo::list(&conn)
    }

    /// Upsert a chat document (last write wins).
    pub fn put_chat(&self, chat: &Chat) -> Result<()> {
        let conn = self.pool.get()?;
        ChatRepo::upsert(&conn, chat)
    }

    /// Fetch one chat.
    pub fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        let conn = self.pool.get()?;
        ChatRepo::get(&conn, chat_id)
    }

    /// The active chat bound to a device, if any.
    pub fn find_active_device_chat(&self, device_id: &str) -> Result<Option<Chat>> {
        let conn = self.pool.get()?;
        ChatRepo::find_active_for_device(&conn, device_id)
    }

    /// Delete a chat and every message sharing its ID, in one transaction.
    /// Returns whether the chat row existed.
    #[instrument(skip(self))]
    pub fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let removed_messages = MessageRepo::delete_for_chat(&tx, chat_id)?;
        let existed = ChatRepo::delete(&tx, chat_id)?;
        tx.commit()?;
        debug!(chat_id, removed_messages, existed, "chat deleted");
        Ok(existed)
    }

    // ── Messages ────────────────────────────────────────────────────────

    /// Append one message to its chat.
    pub fn add_message(&self, message: &Message) -> Result<()> {
        let conn = self.pool.get()?;
        MessageRepo::append(&conn, message)
    }

    /// All messages of one chat, oldest first.
    pub fn chat_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let conn = self.pool.get()?;
        MessageRepo::list_for_chat(&conn, chat_id)
    }

    // ── Dedup ledger ────────────────────────────────────────────────────

    /// Record a delivery ID as processed. Returns `true` when this call won
    /// the insert; `false` means the event was already handled (success for
    /// the caller, not an error).
    pub fn try_mark_processed(&self, event_id: &str, device_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        ProcessedEventRepo::try_insert(&conn, event_id, device_id)
    }

    /// Whether a delivery ID has been handled.
    pub fn is_processed(&self, event_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        ProcessedEventRepo::contains(&conn, event_id)
    }

    /// Fetch one ledger row.
    pub fn processed_event(&self, event_id: &str) -> Result<Option<ProcessedEvent>> {
        let conn = self.pool.get()?;
        ProcessedEventRepo::get(&conn, event_id)
    }

    /// Purge ledger rows older than `retention_days`. Returns the count.
    #[instrument(skip(self))]
    pub fn purge_processed_older_than(&self, retention_days: i64) -> Result<usize> {
        let cutoff = (Utc::now() - Duration::days(retention_days)).to_rfc3339();
        let conn = self.pool.get()?;
        let purged = ProcessedEventRepo::purge_before(&conn, &cutoff)?;
        if purged > 0 {
            debug!(purged, retention_days, "purged processed-event rows");
        }
        Ok(purged)
    }

    /// Total ledger rows.
    pub fn processed_count(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        ProcessedEventRepo::count(&conn)
    }
}
