//! Route compilation: validate every document, then emit manifests and
//! validator artifacts.
//!
//! All documents are read and checked concurrently, but nothing is written
//! until every result is in. One malformed file fails the whole build and
//! no manifest is emitted for any function.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use futures::future::{join_all, try_join_all};
use tracing::{debug, info};
use wsroute_core::constants::{MANIFEST_FILE, SCHEMAS_DIR};
use wsroute_core::{CompiledArtifact, RouteManifest, Violation, artifact_file_name};
use wsroute_settings::BuildSettings;

use crate::discovery::{RouteFile, discover_route_files, read_route_document};
use crate::errors::{CompileError, Result, StructuralConfigError};
use crate::schema::RouteDocumentValidator;

/// A route file that passed structural validation.
#[derive(Clone, Debug)]
pub struct ValidatedRoutes {
    /// Source file.
    pub file: RouteFile,
    /// Parsed manifest.
    pub manifest: RouteManifest,
}

/// Outputs written for one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledFunction {
    /// Function name.
    pub name: String,
    /// Directory holding the manifest and artifacts.
    pub schemas_dir: PathBuf,
    /// Path of the minified manifest.
    pub manifest_path: PathBuf,
    /// Route keys of the manifest, sorted.
    pub route_keys: Vec<String>,
    /// Artifact paths, one per route with a schema.
    pub artifacts: Vec<PathBuf>,
}

/// Result of a successful build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Compiled functions, sorted by name.
    pub functions: Vec<CompiledFunction>,
    /// Functions whose outputs were removed because their route file is gone.
    pub pruned: Vec<String>,
}

/// Validate all route files, aggregating every violation.
pub async fn validate_route_files(files: &[RouteFile]) -> Result<Vec<ValidatedRoutes>> {
    let validator = RouteDocumentValidator::new()?;

    let results = join_all(files.iter().map(|file| {
        let validator = &validator;
        async move {
            let outcome = validate_one(validator, file).await;
            (file, outcome)
        }
    }))
    .await;

    let mut failed = StructuralConfigError::default();
    let mut validated = Vec::with_capacity(results.len());
    for (file, outcome) in results {
        match outcome {
            Ok(manifest) => validated.push(ValidatedRoutes {
                file: file.clone(),
                manifest,
            }),
            Err(violations) => {
                let _ = failed.files.insert(file.file_name.clone(), violations);
            }
        }
    }

    if failed.is_empty() {
        Ok(validated)
    } else {
        Err(failed.into())
    }
}

async fn validate_one(
    validator: &RouteDocumentValidator,
    file: &RouteFile,
) -> std::result::Result<RouteManifest, Vec<Violation>> {
    let document = read_route_document(file).await.map_err(|v| vec![v])?;
    let violations = validator.validate(&document);
    if !violations.is_empty() {
        return Err(violations);
    }
    serde_json::from_value(document).map_err(|e| vec![Violation::new("", e.to_string())])
}

/// Write the manifest and artifacts of one function under `output_dir`.
///
/// The function's schemas directory is recreated so stale artifacts from an
/// earlier build never survive. The manifest is written last.
pub async fn emit_function(
    routes: &ValidatedRoutes,
    output_dir: &Path,
) -> Result<CompiledFunction> {
    let function = &routes.file.function;
    let schemas_dir = output_dir.join(function).join(SCHEMAS_DIR);

    let _ = remove_schemas_dir(&schemas_dir).await?;
    tokio::fs::create_dir_all(&schemas_dir)
        .await
        .map_err(|e| CompileError::io("create", &schemas_dir, e))?;

    let artifacts = try_join_all(routes.manifest.schema_routes().map(|(route_key, schema)| {
        let path = schemas_dir.join(artifact_file_name(route_key));
        let artifact = CompiledArtifact::new(route_key, schema.clone());
        async move {
            let bytes = serde_json::to_vec(&artifact).map_err(|source| CompileError::Serialize {
                what: format!("validator for route '{}'", artifact.route_key),
                source,
            })?;
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| CompileError::io("write", &path, e))?;
            debug!(
                route_key = %artifact.route_key,
                path = %path.display(),
                "wrote validator artifact"
            );
            Ok::<_, CompileError>(path)
        }
    }))
    .await?;

    let manifest_path = schemas_dir.join(MANIFEST_FILE);
    let manifest_json = routes
        .manifest
        .to_minified_json()
        .map_err(|source| CompileError::Serialize {
            what: format!("manifest for function '{function}'"),
            source,
        })?;
    tokio::fs::write(&manifest_path, manifest_json)
        .await
        .map_err(|e| CompileError::io("write", &manifest_path, e))?;

    info!(
        function = %function,
        routes = routes.manifest.len(),
        validators = artifacts.len(),
        "compiled route manifest"
    );

    Ok(CompiledFunction {
        name: function.clone(),
        schemas_dir,
        manifest_path,
        route_keys: routes.manifest.route_keys().map(str::to_owned).collect(),
        artifacts,
    })
}

/// Remove the schemas directory of every function under `output_dir` that
/// is not in `keep`.
///
/// Only `<function>/websocket-schemas/` is removed; anything else another
/// build step put in the function's output directory stays. Returns the
/// pruned function names, sorted.
pub async fn prune_stale_outputs(output_dir: &Path, keep: &BTreeSet<&str>) -> Result<Vec<String>> {
    let exists = tokio::fs::try_exists(output_dir)
        .await
        .map_err(|e| CompileError::io("inspect", output_dir, e))?;
    if !exists {
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(output_dir)
        .await
        .map_err(|e| CompileError::io("read", output_dir, e))?;

    let mut pruned = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CompileError::io("read", output_dir, e))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map_err(|e| CompileError::io("inspect", &entry.path(), e))?
            .is_dir();
        let function = entry.file_name().to_string_lossy().into_owned();
        if !is_dir || keep.contains(function.as_str()) {
            continue;
        }
        if remove_schemas_dir(&entry.path().join(SCHEMAS_DIR)).await? {
            info!(function = %function, "removed outputs of function without route file");
            pruned.push(function);
        }
    }

    pruned.sort();
    Ok(pruned)
}

/// Remove a schemas directory if present; returns whether one was removed.
async fn remove_schemas_dir(schemas_dir: &Path) -> Result<bool> {
    let exists = tokio::fs::try_exists(schemas_dir)
        .await
        .map_err(|e| CompileError::io("inspect", schemas_dir, e))?;
    if !exists {
        return Ok(false);
    }
    tokio::fs::remove_dir_all(schemas_dir)
        .await
        .map_err(|e| CompileError::io("clear", schemas_dir, e))?;
    Ok(true)
}

/// Discover, validate and emit every route file of the project, then prune
/// outputs of functions that no longer have one.
pub async fn compile_all(settings: &BuildSettings) -> Result<CompileReport> {
    let files = discover_route_files(&settings.functions_path()).await?;
    let validated = validate_route_files(&files).await?;

    let output_dir = settings.output_path();
    let functions = try_join_all(
        validated
            .iter()
            .map(|routes| emit_function(routes, &output_dir)),
    )
    .await?;

    let keep: BTreeSet<&str> = files.iter().map(|f| f.function.as_str()).collect();
    let pruned = prune_stale_outputs(&output_dir, &keep).await?;

    Ok(CompileReport { functions, pruned })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
