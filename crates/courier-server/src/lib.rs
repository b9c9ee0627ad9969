//! # courier-server
//!
//! The relay daemon's serving layer: Axum HTTP + WebSocket routes, the
//! connection registry and action dispatcher, the streaming relay, and
//! the external device bridge with its dedup ledger sweeps.

#![deny(unsafe_code)]

pub mod bridge;
pub mod handlers;
pub mod metrics;
pub mod relay;
pub mod routes;
pub mod ws;
