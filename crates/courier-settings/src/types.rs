//! Settings structs and compiled defaults.
//!
//! The JSON file uses camelCase keys; every field has a default so a partial
//! file (or no file at all) always produces a complete value.

use serde::{Deserialize, Serialize};

/// Root settings value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourierSettings {
    /// HTTP/WebSocket server.
    pub server: ServerSettings,
    /// SQLite store.
    pub storage: StorageSettings,
    /// Generation backend.
    pub llm: LlmSettings,
    /// External channel bridge.
    pub bridge: BridgeSettings,
}

/// Server bind/auth settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    /// Bind address.
    pub bind: String,
    /// Listen port.
    pub port: u16,
    /// Shared secret for WebSocket connects and the ingest route.
    pub api_token: String,
    /// `development` allows unauthenticated WebSocket connects.
    pub environment: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            api_token: String::new(),
            environment: "development".to_string(),
        }
    }
}

/// SQLite location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSettings {
    /// Database file path.
    pub db_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: "courier.db".to_string(),
        }
    }
}

/// Generation backend (OpenAI-compatible chat completions).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
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
    /// Inserted when a conversation carries no system turn.
    pub system_prompt: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            system_prompt: "You are a helpful assistant named Courier. \
                            You provide concise and accurate information."
                .to_string(),
        }
    }
}

/// External channel bridge knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeSettings {
    /// Master switch; the bridge tasks are not spawned when false.
    pub enabled: bool,
    /// Hostname of the device hub, e.g. `myhub.example-devices.net`.
    pub hub_hostname: String,
    /// Shared-access key name used in the signature header.
    pub key_name: String,
    /// Base64-encoded shared-access key.
    pub key: String,
    /// REST API version query parameter for device pushes.
    pub api_version: String,
    /// Signature lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Bound on one device delivery (send + acknowledge).
    pub device_timeout_secs: u64,
    /// ProcessedEvent retention window in days.
    pub retention_days: i64,
    /// Interval between ledger cleanup sweeps, in seconds.
    pub cleanup_interval_secs: u64,
    /// Characters per chunk when mirroring a device reply to live viewers.
    pub mirror_chunk_size: usize,
    /// Inter-chunk delay for the mirrored typing cadence, in milliseconds.
    pub mirror_chunk_delay_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hub_hostname: String::new(),
            key_name: "service".to_string(),
            key: String::new(),
            api_version: "2020-03-13".to_string(),
            token_ttl_secs: 3600,
            device_timeout_secs: 30,
            retention_days: 7,
            cleanup_interval_secs: 24 * 60 * 60,
            mirror_chunk_size: 8,
            mirror_chunk_delay_ms: 50,
        }
    }
}
