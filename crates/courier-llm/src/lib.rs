//! # courier-llm
//!
//! The [`provider::CompletionProvider`] trait — a streaming text-completion
//! backend consumed as an ordered sequence of fragments — and the
//! OpenAI-compatible SSE implementation in [`openai`].
//!
//! The relay layer depends only on the trait; tests substitute scripted
//! providers to exercise streaming and failure paths without a network.

#![deny(unsafe_code)]

pub mod openai;
pub mod provider;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{
    CompletionEvent, CompletionProvider, CompletionStream, ProviderError, ProviderResult,
};
