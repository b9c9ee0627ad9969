//! Action dispatch for inbound WebSocket commands.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::envelope::Command;
use courier_core::error::RelayError;
use courier_core::frame::OutboundFrame;
use tracing::{error, warn};

use crate::handlers::HandlerContext;
use crate::metrics::{ACTION_ERRORS_TOTAL, ACTIONS_TOTAL};

/// A handler bound to a single action name.
///
/// Returns the reply frame for the issuing connection, or `None` when
/// the handler delivers its output some other way (e.g. streaming).
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Execute the command on behalf of `connection_id`.
    async fn handle(
        &self,
        command: &Command,
        connection_id: &str,
        ctx: &HandlerContext,
    ) -> Result<Option<OutboundFrame>, RelayError>;
}

/// Routes commands to registered handlers by action name.
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl Dispatcher {
    /// Create a dispatcher with no bindings.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Bind a handler to an action name. Rebinding an existing name
    /// replaces the previous handler.
    pub fn register(&mut self, action: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let _ = self.handlers.insert(action.into(), handler);
    }

    /// Registered action names, for startup logging.
    pub fn actions(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Dispatch a command, mapping every failure to a single error
    /// frame for the issuing connection.
    pub async fn dispatch(
        &self,
        command: &Command,
        connection_id: &str,
        ctx: &HandlerContext,
    ) -> Option<OutboundFrame> {
        metrics::counter!(ACTIONS_TOTAL, "action" => command.action.clone()).increment(1);
        let Some(handler) = self.handlers.get(&command.action) else {
            warn!(action = %command.action, connection_id, "unknown action");
            metrics::counter!(ACTION_ERRORS_TOTAL, "action" => command.action.clone())
                .increment(1);
            return Some(OutboundFrame::error(
                RelayError::UnknownAction(command.action.clone()).to_string(),
            ));
        };
        match handler.handle(command, connection_id, ctx).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(action = %command.action, connection_id, error = %e, "action failed");
                metrics::counter!(ACTION_ERRORS_TOTAL, "action" => command.action.clone())
                    .increment(1);
                Some(OutboundFrame::error(e.to_string()))
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
