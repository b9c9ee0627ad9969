//! Message repository — append and chronological reads, partitioned by chat.

use courier_core::model::{Message, Role};
use rusqlite::{Connection, Row, params};

use crate::errors::{Result, StoreError};

/// Message repository — stateless, every method takes `&Connection`.
pub struct MessageRepo;

impl MessageRepo {
    /// Append one message. Messages are immutable; re-inserting an existing
    /// `(chat_id, id)` pair is a last-write-wins upsert of the same document.
    pub fn append(conn: &Connection, message: &Message) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO messages (id, chat_id, content, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(chat_id, id) DO UPDATE SET
                 content = excluded.content,
                 role = excluded.role",
            params![
                message.id,
                message.chat_id,
                message.content,
                message.role.as_str(),
                message.created_at
            ],
        )?;
        Ok(())
    }

    /// All messages of one chat, oldest first.
    pub fn list_for_chat(conn: &Connection, chat_id: &str) -> Result<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, content, role, created_at
             FROM messages WHERE chat_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![chat_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(Self::decode).collect()
    }

    /// Delete all messages of one chat. Returns the number removed.
    pub fn delete_for_chat(conn: &Connection, chat_id: &str) -> Result<usize> {
        let deleted = conn.execute("DELETE FROM messages WHERE chat_id = ?1", params![chat_id])?;
        Ok(deleted)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<(Message, String)> {
        Ok((
            Message {
                id: row.get(0)?,
                chat_id: row.get(1)?,
                content: row.get(2)?,
                role: Role::User, // placeholder, decoded below
                created_at: row.get(4)?,
            },
            row.get(3)?,
        ))
    }

    fn decode((mut message, role): (Message, String)) -> Result<Message> {
        message.role = Role::parse(&role)
            .ok_or_else(|| StoreError::CorruptRow(format!("unknown role '{role}'")))?;
        Ok(message)
    }
}
