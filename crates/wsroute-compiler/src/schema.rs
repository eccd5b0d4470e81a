//! Structural validation of route-definition documents.
//!
//! A document is checked twice: against the route-file meta-schema (shape,
//! allowed keys, parser values) and by compiling every declared body schema,
//! which rejects schemas that are not valid JSON Schema. All violations are
//! returned; nothing stops at the first one.

use jsonschema::Validator;
use serde_json::{Value, json};
use wsroute_core::Violation;
use wsroute_core::violation::escape_pointer_token;

use crate::errors::{CompileError, Result};

/// Meta-schema every route-definition document must satisfy.
pub fn route_document_schema() -> Value {
    json!({
        "type": "object",
        "propertyNames": { "minLength": 1 },
        "additionalProperties": {
            "type": "object",
            "properties": {
                "parser": { "enum": ["text", "json", "formdata"] },
                "schema": { "type": ["object", "boolean"] }
            },
            "additionalProperties": false
        }
    })
}

/// Compiled meta-schema, shared by every document of a build.
pub struct RouteDocumentValidator {
    meta: Validator,
}

impl RouteDocumentValidator {
    /// Compile the meta-schema.
    pub fn new() -> Result<Self> {
        let meta = jsonschema::validator_for(&route_document_schema()).map_err(|e| {
            CompileError::Internal(format!("route meta-schema does not compile: {e}"))
        })?;
        Ok(Self { meta })
    }

    /// All violations in `document`; empty means valid.
    pub fn validate(&self, document: &Value) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .meta
            .iter_errors(document)
            .map(|e| Violation::new(e.instance_path.to_string(), e.to_string()))
            .collect();

        if let Value::Object(routes) = document {
            for (route_key, definition) in routes {
                let Some(schema) = definition.get("schema") else {
                    continue;
                };
                if !(schema.is_object() || schema.is_boolean()) {
                    // already reported by the meta-schema
                    continue;
                }
                if let Err(violation) = compile_body_schema(schema) {
                    let prefix = format!("/{}/schema", escape_pointer_token(route_key));
                    violations.push(violation.prefixed(&prefix));
                }
            }
        }

        violations
    }
}

/// Compile one body schema.
///
/// On failure the returned violation's path points into the schema itself.
pub fn compile_body_schema(schema: &Value) -> std::result::Result<Validator, Violation> {
    jsonschema::validator_for(schema)
        .map_err(|e| Violation::new(e.instance_path.to_string(), e.to_string()))
}
