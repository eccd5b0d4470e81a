//! Route definitions and the compiled manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Strategy for turning a raw payload into a structured value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserMode {
    /// Raw string, unchanged.
    #[default]
    Text,
    /// JSON document.
    Json,
    /// URL-encoded key/value pairs.
    Formdata,
}

impl ParserMode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Formdata => "formdata",
        }
    }
}

/// Body-handling configuration of one route key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    /// Declared parser; [`ParserMode::Text`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserMode>,
    /// JSON Schema for the parsed body. Routes without one are not parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl RouteDefinition {
    /// Effective parser mode.
    pub fn parser_mode(&self) -> ParserMode {
        self.parser.unwrap_or_default()
    }

    /// Whether a body schema is declared.
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }
}

/// Immutable mapping `routeKey → RouteDefinition` for one function.
///
/// Keys are unique by construction and iterate in sorted order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteManifest {
    routes: BTreeMap<String, RouteDefinition>,
}

impl RouteManifest {
    /// Build a manifest from its routes.
    pub fn new(routes: BTreeMap<String, RouteDefinition>) -> Self {
        Self { routes }
    }

    /// Parse a manifest from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize without whitespace.
    pub fn to_minified_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Look up a route definition.
    pub fn get(&self, route_key: &str) -> Option<&RouteDefinition> {
        self.routes.get(route_key)
    }

    /// All route keys, sorted.
    pub fn route_keys(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Routes that declare a body schema.
    pub fn schema_routes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.routes
            .iter()
            .filter_map(|(key, def)| def.schema.as_ref().map(|s| (key.as_str(), s)))
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the manifest has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parser_defaults_to_text() {
        let def = RouteDefinition::default();
        assert_eq!(def.parser_mode(), ParserMode::Text);
        assert!(!def.has_schema());
    }

    #[test]
    fn parser_mode_wire_names() {
        let def: RouteDefinition = serde_json::from_value(json!({"parser": "formdata"})).unwrap();
        assert_eq!(def.parser_mode(), ParserMode::Formdata);
        assert_eq!(ParserMode::Json.as_str(), "json");
    }

    #[test]
    fn unknown_route_fields_rejected() {
        let result: Result<RouteDefinition, _> =
            serde_json::from_value(json!({"parser": "json", "extra": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn manifest_minifies_and_skips_absent_fields() {
        let manifest: RouteManifest = serde_json::from_value(json!({
            "sendMessage": { "parser": "json", "schema": { "type": "object" } },
            "ping": {}
        }))
        .unwrap();
        let text = manifest.to_minified_json().unwrap();
        assert_eq!(
            text,
            r#"{"ping":{},"sendMessage":{"parser":"json","schema":{"type":"object"}}}"#
        );
    }

    #[test]
    fn schema_routes_filters_unvalidated() {
        let manifest: RouteManifest = serde_json::from_value(json!({
            "a": { "schema": true },
            "b": { "parser": "json" }
        }))
        .unwrap();
        let keys: Vec<&str> = manifest.schema_routes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a"]);
        assert_eq!(manifest.route_keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn from_slice_rejects_non_object() {
        assert!(RouteManifest::from_slice(b"[1,2]").is_err());
    }
}
