//! Lazy, load-once access to the deployed route manifest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;
use wsroute_core::RouteManifest;
use wsroute_core::constants::MANIFEST_FILE;

use crate::errors::InitializationError;

/// Reads the manifest on first access and caches it for the process lifetime.
#[derive(Debug)]
pub struct ManifestLoader {
    path: PathBuf,
    manifest: OnceCell<Arc<RouteManifest>>,
}

impl ManifestLoader {
    /// Loader for the manifest inside `schemas_dir`.
    pub fn new(schemas_dir: &Path) -> Self {
        Self {
            path: schemas_dir.join(MANIFEST_FILE),
            manifest: OnceCell::new(),
        }
    }

    /// Manifest path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the manifest has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.manifest.initialized()
    }

    /// The manifest, reading it on first call.
    pub async fn get(&self) -> Result<Arc<RouteManifest>, InitializationError> {
        self.manifest
            .get_or_try_init(|| read_manifest(&self.path))
            .await
            .cloned()
    }
}

async fn read_manifest(path: &Path) -> Result<Arc<RouteManifest>, InitializationError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InitializationError::ManifestMissing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(InitializationError::ManifestUnreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let manifest =
        RouteManifest::from_slice(&bytes).map_err(|source| InitializationError::ManifestInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), routes = manifest.len(), "loaded route manifest");
    Ok(Arc::new(manifest))
}
