//! Settings loading: defaults ← JSON file deep-merge ← env overrides.

use std::path::Path;

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::CourierSettings;

/// Deep-merge `overlay` onto `base`. Objects merge recursively; every other
/// value type in `overlay` replaces the one in `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from a specific file path, merging over defaults and then
/// applying `COURIER_*` env overrides. A missing file is an error; callers
/// decide whether that falls back to defaults.
pub fn load_settings_from_path(path: &Path) -> Result<CourierSettings> {
    let text = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let file_value: Value = serde_json::from_str(&text)?;

    let defaults = serde_json::to_value(CourierSettings::default())?;
    let merged = deep_merge(defaults, file_value);
    let mut settings: CourierSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Compiled defaults with env overrides applied (no file layer).
pub fn load_default_settings() -> CourierSettings {
    let mut settings = CourierSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Apply `COURIER_*` environment overrides (highest-priority layer).
fn apply_env_overrides(settings: &mut CourierSettings) {
    if let Some(v) = env_var("COURIER_BIND") {
        settings.server.bind = v;
    }
    if let Some(v) = env_var("COURIER_PORT").and_then(|v| v.parse().ok()) {
        settings.server.port = v;
    }
    if let Some(v) = env_var("COURIER_API_TOKEN") {
        settings.server.api_token = v;
    }
    if let Some(v) = env_var("COURIER_ENVIRONMENT") {
        settings.server.environment = v;
    }
    if let Some(v) = env_var("COURIER_DB_PATH") {
        settings.storage.db_path = v;
    }
    if let Some(v) = env_var("COURIER_LLM_BASE_URL") {
        settings.llm.base_url = v;
    }
    if let Some(v) = env_var("COURIER_LLM_API_KEY") {
        settings.llm.api_key = v;
    }
    if let Some(v) = env_var("COURIER_LLM_MODEL") {
        settings.llm.model = v;
    }
    if let Some(v) = env_var("COURIER_BRIDGE_ENABLED") {
        settings.bridge.enabled = matches!(v.as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = env_var("COURIER_HUB_HOSTNAME") {
        settings.bridge.hub_hostname = v;
    }
    if let Some(v) = env_var("COURIER_HUB_KEY_NAME") {
        settings.bridge.key_name = v;
    }
    if let Some(v) = env_var("COURIER_HUB_KEY") {
        settings.bridge.key = v;
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
