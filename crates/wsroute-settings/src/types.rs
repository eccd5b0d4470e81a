//! Settings types with compiled defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wsroute_core::constants::{NAME, SCHEMAS_DIR};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WsRouteSettings {
    /// Settings read by the message runtime.
    pub runtime: RuntimeSettings,
    /// Settings read by the route compiler.
    pub build: BuildSettings,
}

/// What the runtime does when a route's validator artifact cannot be loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorFailurePolicy {
    /// Install a permissive validator; the route becomes unvalidated.
    #[default]
    Open,
    /// Reject every message on that route with a 500.
    Closed,
}

/// Runtime settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    /// Directory containing the manifest and validator artifacts.
    pub schemas_dir: PathBuf,
    /// Behavior on validator load failure.
    pub validator_failure: ValidatorFailurePolicy,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            schemas_dir: default_schemas_dir(),
            validator_failure: ValidatorFailurePolicy::Open,
            log_level: "info".into(),
        }
    }
}

/// Artifacts are deployed next to the function code; on Lambda that is
/// `$LAMBDA_TASK_ROOT`.
fn default_schemas_dir() -> PathBuf {
    match std::env::var("LAMBDA_TASK_ROOT") {
        Ok(root) if !root.is_empty() => PathBuf::from(root).join(SCHEMAS_DIR),
        _ => PathBuf::from(SCHEMAS_DIR),
    }
}

/// Build-time settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSettings {
    /// Project root; relative paths below are resolved against it.
    pub project_dir: PathBuf,
    /// Directory holding `<function>.websocket.json` route files.
    pub functions_dir: PathBuf,
    /// Directory receiving `<function>/websocket-schemas/` outputs.
    pub output_dir: PathBuf,
    /// Serverless template (JSON) used for the middleware presence check.
    pub template_file: PathBuf,
    /// Module name that identifies this extension's middleware.
    pub middleware_module: String,
    /// Resource name of the middleware inside that module.
    pub middleware_resource: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            functions_dir: PathBuf::from("serverless/functions"),
            output_dir: PathBuf::from(format!(".{NAME}")).join("serverless/functions"),
            template_file: PathBuf::from("template.json"),
            middleware_module: NAME.into(),
            middleware_resource: "WsRouteMiddleware".into(),
        }
    }
}

impl BuildSettings {
    /// Absolute-or-project-relative functions directory.
    pub fn functions_path(&self) -> PathBuf {
        self.project_dir.join(&self.functions_dir)
    }

    /// Absolute-or-project-relative output directory.
    pub fn output_path(&self) -> PathBuf {
        self.project_dir.join(&self.output_dir)
    }

    /// Absolute-or-project-relative template path.
    pub fn template_path(&self) -> PathBuf {
        self.project_dir.join(&self.template_file)
    }

    /// Settings rooted at `project_dir`, other fields defaulted.
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }
}
