//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`WsRouteSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `WSROUTE_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{ValidatorFailurePolicy, WsRouteSettings};

/// Default settings file name, resolved against the working directory.
pub const SETTINGS_FILE: &str = "wsroute.json";

/// Resolve the settings file path (`$WSROUTE_SETTINGS` or `./wsroute.json`).
pub fn settings_path() -> PathBuf {
    read_env_string("WSROUTE_SETTINGS").map_or_else(|| PathBuf::from(SETTINGS_FILE), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WsRouteSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<WsRouteSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<WsRouteSettings> {
    let defaults = serde_json::to_value(WsRouteSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (file/default value wins).
pub fn apply_env_overrides(
    settings: &mut WsRouteSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("WSROUTE_SCHEMAS_DIR") {
        settings.runtime.schemas_dir = PathBuf::from(v);
    }
    if let Some(v) = read("WSROUTE_VALIDATOR_FAILURE") {
        match parse_failure_policy(&v) {
            Some(policy) => settings.runtime.validator_failure = policy,
            None => {
                tracing::warn!(
                    key = "WSROUTE_VALIDATOR_FAILURE",
                    value = %v,
                    "invalid policy env var, ignoring"
                );
            }
        }
    }
    if let Some(v) = read("WSROUTE_LOG_LEVEL") {
        settings.runtime.log_level = v;
    }
    if let Some(v) = read("WSROUTE_PROJECT_DIR") {
        settings.build.project_dir = PathBuf::from(v);
    }
    if let Some(v) = read("WSROUTE_OUTPUT_DIR") {
        settings.build.output_dir = PathBuf::from(v);
    }
}

/// Parse a validator failure policy (`open`/`closed`, case-insensitive).
pub fn parse_failure_policy(val: &str) -> Option<ValidatorFailurePolicy> {
    match val.to_lowercase().as_str() {
        "open" => Some(ValidatorFailurePolicy::Open),
        "closed" => Some(ValidatorFailurePolicy::Closed),
        _ => None,
    }
}

/// Reject settings that cannot work at all.
pub fn validate(settings: &WsRouteSettings) -> Result<()> {
    if settings.runtime.schemas_dir.as_os_str().is_empty() {
        return Err(SettingsError::InvalidValue(
            "runtime.schemasDir must not be empty".into(),
        ));
    }
    let build = &settings.build;
    if build.middleware_module.is_empty() || build.middleware_resource.is_empty() {
        return Err(SettingsError::InvalidValue(
            "build.middlewareModule and build.middlewareResource must not be empty".into(),
        ));
    }
    Ok(())
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
