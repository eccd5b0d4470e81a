//! Process-wide runtime state.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;
use wsroute_core::RouteManifest;
use wsroute_core::logging;
use wsroute_settings::{RuntimeSettings, get_settings};

use crate::errors::InitializationError;
use crate::manifest::ManifestLoader;
use crate::validators::ValidatorRegistry;

/// Caches shared by every message handled in one process.
///
/// Built once at cold start, wrapped in an `Arc` and passed to the pipeline.
/// Both caches fill at most once; nothing is ever evicted.
#[derive(Debug)]
pub struct RuntimeState {
    settings: RuntimeSettings,
    manifest: ManifestLoader,
    validators: OnceCell<ValidatorRegistry>,
}

impl RuntimeState {
    /// State reading artifacts from `settings.schemas_dir`.
    pub fn new(settings: RuntimeSettings) -> Self {
        let manifest = ManifestLoader::new(&settings.schemas_dir);
        Self {
            settings,
            manifest,
            validators: OnceCell::new(),
        }
    }

    /// State built from the process-wide settings.
    ///
    /// Cold-start path: also installs the global log subscriber at
    /// `runtime.logLevel` unless one is already set.
    pub fn from_settings() -> Self {
        let settings = get_settings().runtime.clone();
        if logging::init_subscriber(&settings.log_level) {
            debug!(level = %settings.log_level, "installed log subscriber");
        }
        Self::new(settings)
    }

    /// Settings in use.
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// The route manifest, loaded on first call.
    pub async fn manifest(&self) -> Result<Arc<RouteManifest>, InitializationError> {
        self.manifest.get().await
    }

    /// The validator registry, resolved from the manifest on first call.
    pub async fn validators(&self) -> Result<&ValidatorRegistry, InitializationError> {
        self.validators
            .get_or_try_init(|| async {
                let manifest = self.manifest().await?;
                let registry = ValidatorRegistry::from_manifest(
                    &manifest,
                    &self.settings.schemas_dir,
                    self.settings.validator_failure,
                );
                debug!(validators = registry.len(), "resolved validator registry");
                Ok(registry)
            })
            .await
    }

    /// Load the manifest and every validator up front.
    ///
    /// Optional: without it everything loads lazily on first use. A broken
    /// manifest surfaces here instead of on the first message.
    pub async fn initialize(&self) -> Result<(), InitializationError> {
        self.validators().await?.preload().await;
        Ok(())
    }
}
