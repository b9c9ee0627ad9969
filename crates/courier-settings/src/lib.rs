//! # courier-settings
//!
//! Configuration for the courier daemon, loaded from three layers
//! (in priority order):
//!
//! 1. **Compiled defaults** — [`CourierSettings::default()`]
//! 2. **Settings file** — JSON, deep-merged over defaults
//! 3. **Environment variables** — `COURIER_*` overrides (highest priority)
//!
//! The process holds one reloadable snapshot: components take an
//! `Arc<CourierSettings>` at construction, so a reload never mutates a value
//! a running task is reading.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_default_settings, load_settings_from_path};
pub use types::*;

use std::path::Path;
use std::sync::{Arc, RwLock};

/// Global settings snapshot.
///
/// `RwLock<Option<Arc<_>>>` rather than `OnceLock` so the cached value can
/// be swapped on reload. Reads are a shared lock plus `Arc::clone`.
static SETTINGS: RwLock<Option<Arc<CourierSettings>>> = RwLock::new(None);

/// Get the current settings snapshot.
///
/// Before [`init_settings`] has run, returns compiled defaults with env
/// overrides applied. Returns an `Arc` so callers hold a consistent view
/// even if another task reloads concurrently.
pub fn get_settings() -> Arc<CourierSettings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }
    let settings = Arc::new(load_default_settings());
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Replace the global snapshot with a specific value.
pub fn init_settings(settings: CourierSettings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Reload from a settings file and swap the global snapshot.
///
/// A file that cannot be read or parsed leaves defaults (with env overrides)
/// in place rather than keeping stale values.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to load settings, using defaults");
            load_default_settings()
        }
    });
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(new);
    tracing::info!(?path, "settings loaded");
}

#[cfg(test)]
pub(crate) fn reset_settings() {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = None;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that mutate the global SETTINGS static must hold this lock
    /// (Rust runs tests in parallel threads).
    static SETTINGS_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn get_before_init_returns_defaults() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        let s = get_settings();
        assert_eq!(s.server.port, 8080);
        reset_settings();
    }

    #[test]
    fn init_settings_sets_custom_value() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        let mut custom = CourierSettings::default();
        custom.server.port = 9999;
        init_settings(custom);
        assert_eq!(get_settings().server.port, 9999);
        reset_settings();
    }

    #[test]
    fn reload_swaps_the_snapshot() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        init_settings(CourierSettings::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": 7171}}"#).unwrap();
        reload_settings_from_path(&path);

        let updated = get_settings();
        assert_eq!(updated.server.port, 7171);
        // Defaults still present under the merge
        assert_eq!(updated.llm.model, "gpt-4o-mini");
        reset_settings();
    }

    #[test]
    fn snapshots_are_isolated_across_reloads() {
        let _lock = SETTINGS_MUTEX.lock().unwrap();
        reset_settings();
        init_settings(CourierSettings::default());

        let snapshot = get_settings();
        assert_eq!(snapshot.server.port, 8080);

        let mut new = CourierSettings::default();
        new.server.port = 5555;
        init_settings(new);

        // Old Arc still sees the old value; fresh reads see the new one.
        assert_eq!(snapshot.server.port, 8080);
        assert_eq!(get_settings().server.port, 5555);
        reset_settings();
    }
}
