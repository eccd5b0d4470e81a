//! Cross-check of middleware wiring against route files.
//!
//! | Route file | Middleware | Result  |
//! |------------|------------|---------|
//! | No         | No         | Valid   |
//! | No         | Yes        | Error   |
//! | Yes        | No         | Warning |
//! | Yes        | Yes        | Valid   |

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use wsroute_core::constants::{FUNCTION_CODE_KEYWORD, FUNCTION_RESOURCE_TYPE};

use crate::errors::{CompileError, ConsistencyError, Result};

/// A middleware reference attached to a function.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MiddlewareRef {
    /// Module providing the middleware; absent for the project's own.
    #[serde(default)]
    pub module: Option<String>,
    /// Middleware resource name.
    pub resource: String,
}

/// A function declared in the serverless template.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FunctionDecl {
    /// Function name.
    #[serde(default)]
    pub name: String,
    /// Middlewares wired to the function.
    #[serde(default)]
    pub middlewares: Vec<MiddlewareRef>,
}

impl FunctionDecl {
    /// Whether the function uses the given middleware.
    pub fn uses_middleware(&self, module: &str, resource: &str) -> bool {
        self.middlewares
            .iter()
            .any(|m| m.module.as_deref() == Some(module) && m.resource == resource)
    }
}

#[derive(Deserialize)]
struct Template {
    #[serde(rename = "Resources", default)]
    resources: BTreeMap<String, Resource>,
}

#[derive(Deserialize)]
struct Resource {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Properties", default)]
    properties: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Template reading
// ─────────────────────────────────────────────────────────────────────────────

/// Extract function declarations from a JSON serverless template.
///
/// Functions whose `CodeUri` does not use the function keyword are skipped.
pub fn function_decls_from_template(template: &Value) -> serde_json::Result<Vec<FunctionDecl>> {
    let template = Template::deserialize(template)?;
    let mut decls = Vec::new();
    for resource in template.resources.into_values() {
        if resource.kind != FUNCTION_RESOURCE_TYPE {
            continue;
        }
        let Some(code) = resource
            .properties
            .get("CodeUri")
            .and_then(|uri| uri.get(FUNCTION_CODE_KEYWORD))
        else {
            continue;
        };
        decls.push(FunctionDecl::deserialize(code)?);
    }
    Ok(decls)
}

/// Read function declarations from the template at `path`.
///
/// A missing template yields `None`: there is nothing to check.
pub async fn load_function_decls(path: &Path) -> Result<Option<Vec<FunctionDecl>>> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| CompileError::io("inspect", path, e))?;
    if !exists {
        debug!(path = %path.display(), "no template found, skipping middleware check");
        return Ok(None);
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CompileError::io("read", path, e))?;
    let template: Value = serde_json::from_slice(&bytes).map_err(|source| CompileError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    let decls = function_decls_from_template(&template).map_err(|source| CompileError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(decls))
}

// ─────────────────────────────────────────────────────────────────────────────
// Presence check
// ─────────────────────────────────────────────────────────────────────────────

/// Non-fatal outcome of the presence check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresenceReport {
    /// Functions with a route file but without the middleware, sorted.
    pub functions_without_middleware: Vec<String>,
}

impl PresenceReport {
    /// Whether the check produced warnings.
    pub fn has_warnings(&self) -> bool {
        !self.functions_without_middleware.is_empty()
    }
}

/// Compare middleware wiring with the set of functions that have route files.
///
/// Middleware without a route file is an error naming every such function.
/// A route file without the middleware is only a warning.
pub fn check_middleware_presence(
    decls: &[FunctionDecl],
    route_functions: &BTreeSet<String>,
    module: &str,
    resource: &str,
) -> std::result::Result<PresenceReport, ConsistencyError> {
    let with_middleware: BTreeSet<&str> = decls
        .iter()
        .filter(|d| d.uses_middleware(module, resource))
        .map(|d| d.name.as_str())
        .collect();

    let without_file: Vec<String> = with_middleware
        .iter()
        .filter(|name| !route_functions.contains(**name))
        .map(|name| (*name).to_owned())
        .collect();
    if !without_file.is_empty() {
        return Err(ConsistencyError {
            middleware: format!("{module}/{resource}"),
            functions: without_file,
        });
    }

    let without_middleware: Vec<String> = route_functions
        .iter()
        .filter(|name| !with_middleware.contains(name.as_str()))
        .cloned()
        .collect();
    if !without_middleware.is_empty() {
        warn!(
            middleware = %format!("{module}/{resource}"),
            functions = ?without_middleware,
            "functions have route files but no route middleware"
        );
    }

    Ok(PresenceReport {
        functions_without_middleware: without_middleware,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
