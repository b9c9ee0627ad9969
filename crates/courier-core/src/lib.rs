//! # courier-core
//!
//! Foundation types shared by every courier crate:
//!
//! - **Domain model**: [`model::Chat`], [`model::Message`], [`model::Role`],
//!   [`model::ProcessedEvent`], plus the device request/response bodies.
//! - **Wire envelopes**: [`envelope::Command`] and the normalization of the
//!   two tolerated inbound shapes.
//! - **Frames**: [`frame::OutboundFrame`] — streaming chunks, chat replies,
//!   and error frames, all one tagged serde enum.
//! - **Errors**: [`error::RelayError`] — the error vocabulary handlers speak.
//!
//! Foundation crate: depended on by all other courier crates.

#![deny(unsafe_code)]

pub mod envelope;
pub mod error;
pub mod frame;
pub mod ids;
pub mod model;
