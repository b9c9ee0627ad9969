//! Chat repository — CRUD for the `chats` table.

use courier_core::model::Chat;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;

/// Chat repository — stateless, every method takes `&Connection`.
pub struct ChatRepo;

impl ChatRepo {
    /// Upsert a chat (last write wins, matching the document-store model).
    pub fn upsert(conn: &Connection, chat: &Chat) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO chats (id, name, active, created_at, device_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 active = excluded.active,
                 device_id = excluded.device_id",
            params![
                chat.id,
                chat.name,
                chat.active as i64,
                chat.created_at,
                chat.device_id
            ],
        )?;
        Ok(())
    }

    /// Get a chat by ID.
    pub fn get(conn: &Connection, chat_id: &str) -> Result<Option<Chat>> {
        let row = conn
            .query_row(
                "SELECT id, name, active, created_at, device_id FROM chats WHERE id = ?1",
                params![chat_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All chats, newest first.
    pub fn list(conn: &Connection) -> Result<Vec<Chat>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, active, created_at, device_id
             FROM chats ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The active chat bound to a device, if any.
    pub fn find_active_for_device(conn: &Connection, device_id: &str) -> Result<Option<Chat>> {
        let row = conn
            .query_row(
                "SELECT id, name, active, created_at, device_id FROM chats
                 WHERE device_id = ?1 AND active = 1
                 ORDER BY created_at DESC LIMIT 1",
                params![device_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Delete one chat row. Returns whether a row existed.
    pub fn delete(conn: &Connection, chat_id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM chats WHERE id = ?1", params![chat_id])?;
        Ok(changed > 0)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
        Ok(Chat {
            id: row.get(0)?,
            name: row.get(1)?,
            active: row.get::<_, i64>(2)? != 0,
            created_at: row.get(3)?,
            device_id: row.get(4)?,
        })
    }
}
