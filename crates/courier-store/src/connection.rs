//! Connection pool construction and schema bootstrap.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::info;

use crate::errors::Result;

/// r2d2 pool over SQLite connections.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;
/// One checked-out pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chats (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    active      INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    device_id   TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id          TEXT NOT NULL,
    chat_id     TEXT NOT NULL,
    content     TEXT NOT NULL,
    role        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (chat_id, id)
);
CREATE INDEX IF NOT EXISTS idx_messages_chat_created
    ON messages (chat_id, created_at);

CREATE TABLE IF NOT EXISTS processed_events (
    id            TEXT PRIMARY KEY,
    device_id     TEXT NOT NULL,
    processed_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_processed_events_processed_at
    ON processed_events (processed_at);
";

/// Open (or create) the database at `path` and return a ready pool.
///
/// WAL mode plus a busy timeout lets the per-connection tasks and the
/// bridge's background tasks interleave reads and writes without surfacing
/// `SQLITE_BUSY` to callers.
pub fn open_pool(path: &Path) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
    let pool = r2d2::Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;
    info!(path = %path.display(), "store opened");
    Ok(pool)
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )
}
