//! # wsroute-settings
//!
//! Configuration with layered sources for the `wsroute` compiler and runtime.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WsRouteSettings::default()`]
//! 2. **Settings file**: `./wsroute.json` or `$WSROUTE_SETTINGS` (deep-merged over defaults)
//! 3. **Environment variables**: `WSROUTE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Process-wide settings, loaded on first access.
static SETTINGS: OnceLock<WsRouteSettings> = OnceLock::new();

/// Get the process-wide settings.
///
/// On first call, loads the settings file with env var overrides. If loading
/// fails, the failure is logged and compiled defaults are used.
pub fn get_settings() -> &'static WsRouteSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load settings, using defaults");
            WsRouteSettings::default()
        })
    })
}

/// Initialize the process-wide settings with a specific value.
///
/// Returns the settings back if they were already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: WsRouteSettings) -> std::result::Result<(), WsRouteSettings> {
    SETTINGS.set(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = WsRouteSettings::default();
        let _path = settings_path();
        let _policy = ValidatorFailurePolicy::Closed;
    }
}
