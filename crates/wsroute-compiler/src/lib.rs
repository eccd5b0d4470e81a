//! # wsroute-compiler
//!
//! Build-time half of `wsroute`: turns `<function>.websocket.json` route files
//! into a deployable manifest plus one validator artifact per route with a
//! body schema.
//!
//! - [`Compiler::prebuild`] checks middleware wiring and the structure of
//!   every route file, reporting all problems at once
//! - [`Compiler::build`] runs the checks and then writes, per function,
//!   `<outputDir>/<function>/websocket-schemas/`

#![deny(unsafe_code)]

pub mod compile;
pub mod discovery;
pub mod errors;
pub mod middleware;
pub mod schema;

use std::collections::BTreeSet;

use tracing::info;
use wsroute_settings::BuildSettings;

pub use compile::{CompileReport, CompiledFunction, compile_all, validate_route_files};
pub use discovery::{RouteFile, discover_route_files};
pub use errors::{CompileError, ConsistencyError, Result, StructuralConfigError};
pub use middleware::{FunctionDecl, MiddlewareRef, PresenceReport, check_middleware_presence};

/// Entry point for the build steps of one project.
#[derive(Clone, Debug)]
pub struct Compiler {
    settings: BuildSettings,
}

impl Compiler {
    /// Create a compiler for the given settings.
    pub fn new(settings: BuildSettings) -> Self {
        Self { settings }
    }

    /// Settings in use.
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Cross-check template middleware wiring against route files.
    ///
    /// Skipped (empty report) when the project has no template.
    pub async fn check_middlewares(&self) -> Result<PresenceReport> {
        let Some(decls) = middleware::load_function_decls(&self.settings.template_path()).await?
        else {
            return Ok(PresenceReport::default());
        };
        let files = discover_route_files(&self.settings.functions_path()).await?;
        let route_functions: BTreeSet<String> = files.into_iter().map(|f| f.function).collect();
        Ok(check_middleware_presence(
            &decls,
            &route_functions,
            &self.settings.middleware_module,
            &self.settings.middleware_resource,
        )?)
    }

    /// Run every check without writing anything.
    pub async fn prebuild(&self) -> Result<PresenceReport> {
        let report = self.check_middlewares().await?;
        let files = discover_route_files(&self.settings.functions_path()).await?;
        let _ = validate_route_files(&files).await?;
        Ok(report)
    }

    /// Run the checks, then emit manifests and validator artifacts.
    pub async fn build(&self) -> Result<CompileReport> {
        let _ = self.check_middlewares().await?;
        let report = compile_all(&self.settings).await?;
        info!(
            functions = report.functions.len(),
            pruned = report.pruned.len(),
            "route compilation finished"
        );
        Ok(report)
    }
}
