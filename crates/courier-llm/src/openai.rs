//! OpenAI-compatible chat-completions provider.
//!
//! Speaks the `/v1/chat/completions` SSE protocol: each `data:` event is a
//! JSON chunk carrying `choices[0].delta.content`, and the literal
//! `[DONE]` sentinel terminates the stream.

use async_trait::async_trait;
use courier_core::model::{PromptMessage, Role};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::provider::{
    CompletionEvent, CompletionProvider, CompletionStream, ProviderError, ProviderResult,
};

/// OpenAI-compatible provider configuration.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API base URL, without the `/v1/chat/completions` suffix.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Inserted when the conversation carries no system turn.
    pub system_prompt: String,
}

/// Request body for `/v1/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

/// One SSE chunk.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible streaming completion provider.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new provider.
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new provider with a shared HTTP client.
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", self.config.api_key);
        let _ = headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| {
                ProviderError::NotConfigured(format!("invalid API key header: {e}"))
            })?,
        );
        Ok(headers)
    }

    /// Assemble the request conversation, inserting the configured system
    /// prompt when the caller's history carries none.
    fn build_messages(&self, messages: &[PromptMessage]) -> Vec<PromptMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if !messages.iter().any(|m| m.role == Role::System) {
            out.push(PromptMessage::new(
                Role::System,
                self.config.system_prompt.clone(),
            ));
        }
        out.extend_from_slice(messages);
        out
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn stream_internal(&self, messages: &[PromptMessage]) -> ProviderResult<CompletionStream> {
        if self.config.base_url.is_empty() {
            return Err(ProviderError::NotConfigured("base URL is empty".into()));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: self.build_messages(messages),
            stream: true,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let headers = self.build_headers()?;

        debug!(message_count = request.messages.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "completion API error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let mut sse = response.bytes_stream().eventsource();
        let stream = async_stream::stream! {
            while let Some(event) = sse.next().await {
                let event = match event {
                    Ok(e) => e,
                    Err(e) => {
                        yield Err(ProviderError::Decode(e.to_string()));
                        return;
                    }
                };
                if event.data.trim() == "[DONE]" {
                    yield Ok(CompletionEvent::Done);
                    return;
                }
                match serde_json::from_str::<ChatChunk>(&event.data) {
                    Ok(chunk) => {
                        if let Some(text) = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                            .filter(|t| !t.is_empty())
                        {
                            yield Ok(CompletionEvent::Delta { text });
                        }
                    }
                    Err(e) => {
                        yield Err(ProviderError::Decode(format!("bad chunk: {e}")));
                        return;
                    }
                }
            }
            // Stream ended without the sentinel; treat a clean close as done.
            yield Ok(CompletionEvent::Done);
        };
        Ok(Box::pin(stream))
    }
}

/// Pull a human-readable message out of an error body, falling back to the
/// raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(provider = "openai", model = %self.config.model))]
    async fn stream(&self, messages: &[PromptMessage]) -> ProviderResult<CompletionStream> {
        self.stream_internal(messages).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
