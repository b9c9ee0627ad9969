//! WebSocket transport: connection registry, session lifecycle, and
//! command dispatch.

pub mod connection;
pub mod dispatch;
pub mod registry;
