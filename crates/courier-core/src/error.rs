//! Error vocabulary for the relay pipeline.
//!
//! Handlers and the bridge speak [`RelayError`]; the dispatcher converts it
//! into an error frame at its boundary, so none of these ever crash the
//! hosting process (transport failures are absorbed separately, by the
//! connection registry pruning the dead connection).

use thiserror::Error;

/// Errors a handler or the bridge can surface to a client.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed or incomplete command. The connection stays open.
    #[error("{0}")]
    ClientInput(String),

    /// No handler registered for the action name.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// A downstream dependency (store, generation backend, device channel)
    /// failed or was unavailable.
    #[error("{component} error: {message}")]
    Dependency {
        /// Which dependency failed (`"store"`, `"provider"`, `"device"`).
        component: &'static str,
        /// Human-readable failure description.
        message: String,
    },
}

impl RelayError {
    /// Shorthand for a storage dependency failure.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Dependency {
            component: "store",
            message: err.to_string(),
        }
    }

    /// Shorthand for a generation-backend dependency failure.
    pub fn provider(err: impl std::fmt::Display) -> Self {
        Self::Dependency {
            component: "provider",
            message: err.to_string(),
        }
    }
}
