//! Store error type.

use thiserror::Error;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures at the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite-level failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool exhausted or broken.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A persisted row no longer decodes into the domain model.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}
