//! Compiled validator artifacts.
//!
//! Each route with a body schema gets one artifact file whose name is derived
//! from the route key alone, so the runtime can locate it without an index:
//! `base64url(routeKey + ":body") + ".validator.json"`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::ARTIFACT_EXTENSION;

/// Artifact format understood by this version of the runtime.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Deterministic artifact file name for a route key.
pub fn artifact_file_name(route_key: &str) -> String {
    let schema_key = format!("{route_key}:body");
    format!("{}{ARTIFACT_EXTENSION}", URL_SAFE_NO_PAD.encode(schema_key))
}

/// On-disk form of a compiled body validator.
///
/// The schema has already been checked against its meta-schema at build
/// time; the runtime only has to instantiate it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
    /// Artifact format version.
    pub format: u32,
    /// Route key the schema belongs to.
    pub route_key: String,
    /// The body schema.
    pub schema: Value,
}

impl CompiledArtifact {
    /// Wrap a schema for the given route.
    pub fn new(route_key: impl Into<String>, schema: Value) -> Self {
        Self {
            format: ARTIFACT_FORMAT_VERSION,
            route_key: route_key.into(),
            schema,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn known_route_key_name() {
        // "sendMessage:body" in URL-safe base64 without padding
        assert_eq!(
            artifact_file_name("sendMessage"),
            "c2VuZE1lc3NhZ2U6Ym9keQ.validator.json"
        );
    }

    #[test]
    fn special_route_keys_stay_url_safe() {
        let name = artifact_file_name("$default");
        assert!(name.ends_with(ARTIFACT_EXTENSION));
        assert!(!name.contains('/'));
        assert!(!name.contains('+'));
        assert!(!name.contains('='));
    }

    #[test]
    fn artifact_serializes_camel_case() {
        let artifact = CompiledArtifact::new("join", json!({"type": "string"}));
        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["format"], 1);
        assert_eq!(value["routeKey"], "join");
        assert_eq!(value["schema"]["type"], "string");
    }

    proptest! {
        #[test]
        fn names_are_filesystem_safe(route_key in ".{0,64}") {
            let name = artifact_file_name(&route_key);
            let stem = name.strip_suffix(ARTIFACT_EXTENSION).unwrap();
            prop_assert!(stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }

        #[test]
        fn distinct_keys_get_distinct_names(a in "[a-zA-Z$]{1,16}", b in "[a-zA-Z$]{1,16}") {
            prop_assume!(a != b);
            prop_assert_ne!(artifact_file_name(&a), artifact_file_name(&b));
        }
    }
}
