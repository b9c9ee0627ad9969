//! # courier-store
//!
//! SQLite-backed document store for the courier daemon: chats, messages,
//! and the processed-event dedup ledger.
//!
//! Layout follows a pool + stateless-repositories + facade split:
//! [`connection`] builds the r2d2 pool and bootstraps the schema,
//! [`repositories`] hold per-table SQL, and [`store::Store`] is the only
//! type the rest of the system touches.
//!
//! The store models a simple document database: independent per-document
//! upserts with last-write-wins semantics, reads by key or by partition
//! (chat ID for messages). The one multi-row operation — chat delete —
//! runs in a transaction so no caller observes a chat without its messages
//! half-removed.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod repositories;
pub mod store;

pub use errors::{Result, StoreError};
pub use store::Store;
