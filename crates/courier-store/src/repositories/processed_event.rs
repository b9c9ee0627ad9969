//! ProcessedEvent repository — the dedup ledger.
//!
//! The primary key on `id` is the idempotency gate: `INSERT OR IGNORE`
//! makes the first writer win and tells later writers (redeliveries)
//! that the event was already handled.

use courier_core::model::ProcessedEvent;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// ProcessedEvent repository — stateless, every method takes `&Connection`.
pub struct ProcessedEventRepo;

impl ProcessedEventRepo {
    /// Record an event as processed. Returns `true` if this call inserted
    /// the row, `false` if the event was already recorded.
    pub fn try_insert(conn: &Connection, event_id: &str, device_id: &str) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO processed_events (id, device_id, processed_at)
             VALUES (?1, ?2, ?3)",
            params![event_id, device_id, now],
        )?;
        Ok(inserted > 0)
    }

    /// Whether an event ID has been recorded.
    pub fn contains(conn: &Connection, event_id: &str) -> Result<bool> {
        let row: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM processed_events WHERE id = ?1",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Fetch one ledger row.
    pub fn get(conn: &Connection, event_id: &str) -> Result<Option<ProcessedEvent>> {
        let row = conn
            .query_row(
                "SELECT id, device_id, processed_at FROM processed_events WHERE id = ?1",
                params![event_id],
                |row| {
                    Ok(ProcessedEvent {
                        id: row.get(0)?,
                        device_id: row.get(1)?,
                        processed_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Delete rows processed before `cutoff` (RFC 3339). Returns the count.
    pub fn purge_before(conn: &Connection, cutoff: &str) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM processed_events WHERE processed_at < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    /// Total ledger rows (test and diagnostics helper).
    pub fn count(conn: &Connection) -> Result<i64> {
        let count =
            conn.query_row("SELECT COUNT(*) FROM processed_events", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_pool;

    fn test_conn() -> (tempfile::TempDir, crate::connection::PooledConnection) {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(&dir.path().join("test.db")).unwrap();
        let conn = pool.get().unwrap();
        (dir, conn)
    }

    #[test]
    fn first_insert_wins_second_reports_duplicate() {
        let (_dir, conn) = test_conn();
        assert!(ProcessedEventRepo::try_insert(&conn, "evt_1", "pi-1").unwrap());
        assert!(!ProcessedEventRepo::try_insert(&conn, "evt_1", "pi-1").unwrap());
        assert_eq!(ProcessedEventRepo::count(&conn).unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_keeps_original_row() {
        let (_dir, conn) = test_conn();
        let _ = ProcessedEventRepo::try_insert(&conn, "evt_1", "pi-original").unwrap();
        let _ = ProcessedEventRepo::try_insert(&conn, "evt_1", "pi-imposter").unwrap();
        let row = ProcessedEventRepo::get(&conn, "evt_1").unwrap().unwrap();
        assert_eq!(row.device_id, "pi-original");
    }

    #[test]
    fn contains_reflects_inserts() {
        let (_dir, conn) = test_conn();
        assert!(!ProcessedEventRepo::contains(&conn, "evt_1").unwrap());
        let _ = ProcessedEventRepo::try_insert(&conn, "evt_1", "pi-1").unwrap();
        assert!(ProcessedEventRepo::contains(&conn, "evt_1").unwrap());
    }

    #[test]
    fn purge_removes_only_older_rows() {
        let (_dir, conn) = test_conn();
        let _ = conn
            .execute(
                "INSERT INTO processed_events (id, device_id, processed_at)
                 VALUES ('evt_old', 'pi-1', '2026-01-01T00:00:00+00:00')",
                [],
            )
            .unwrap();
        let _ = ProcessedEventRepo::try_insert(&conn, "evt_new", "pi-1").unwrap();

        let purged = ProcessedEventRepo::purge_before(&conn, "2026-06-01T00:00:00+00:00").unwrap();
        assert_eq!(purged, 1);
        assert!(!ProcessedEventRepo::contains(&conn, "evt_old").unwrap());
        assert!(ProcessedEventRepo::contains(&conn, "evt_new").unwrap());
    }
}
