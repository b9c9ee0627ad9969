//! Settings error type.

use thiserror::Error;

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Failures while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// File contents were not valid settings JSON.
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}
