//! Stateless repositories — every method takes `&Connection`.

pub mod chat;
pub mod message;
pub mod processed_event;
