//! Per-route validator registry.
//!
//! The registry is resolved from the manifest: every route with a body schema
//! gets one entry, starting [`ValidatorState::Unloaded`]. The artifact is read
//! on first use and the entry moves to `Loaded`, or, if the artifact is
//! missing or corrupt, to `Fallback` (fail-open) or `Rejected` (fail-closed).
//! Entries only ever leave `Unloaded`; concurrent first uses may both read
//! the artifact, but the first result installed wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use jsonschema::Validator;
use metrics::counter;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, warn};
use wsroute_core::{
    ARTIFACT_FORMAT_VERSION, CompiledArtifact, RouteManifest, Violation, artifact_file_name,
};
use wsroute_settings::ValidatorFailurePolicy;

use crate::errors::{MessageError, ValidatorLoadError};
use crate::metrics::WS_VALIDATOR_FALLBACKS_TOTAL;

/// Executable body validator of one route.
pub enum RouteValidator {
    /// Compiled from the route's artifact.
    Compiled(Validator),
    /// Accepts everything; installed when the artifact could not be loaded.
    Permissive,
}

impl RouteValidator {
    /// All violations of `body`; empty means valid.
    pub fn violations(&self, body: &Value) -> Vec<Violation> {
        match self {
            Self::Compiled(validator) => validator
                .iter_errors(body)
                .map(|e| Violation::new(e.instance_path.to_string(), e.to_string()))
                .collect(),
            Self::Permissive => Vec::new(),
        }
    }

    /// Whether this is the fail-open stand-in.
    pub fn is_permissive(&self) -> bool {
        matches!(self, Self::Permissive)
    }
}

impl std::fmt::Debug for RouteValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compiled(_) => f.write_str("RouteValidator::Compiled"),
            Self::Permissive => f.write_str("RouteValidator::Permissive"),
        }
    }
}

/// Observable state of a registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidatorState {
    /// Not requested yet.
    Unloaded,
    /// Artifact loaded and compiled.
    Loaded,
    /// Artifact failed to load; permissive validator installed.
    Fallback,
    /// Artifact failed to load; messages on this route are rejected.
    Rejected,
}

enum Slot {
    Unloaded,
    Loaded(Arc<RouteValidator>),
    Fallback(Arc<RouteValidator>),
    Rejected,
}

impl Slot {
    fn state(&self) -> ValidatorState {
        match self {
            Self::Unloaded => ValidatorState::Unloaded,
            Self::Loaded(_) => ValidatorState::Loaded,
            Self::Fallback(_) => ValidatorState::Fallback,
            Self::Rejected => ValidatorState::Rejected,
        }
    }

    /// Settled outcome, or `None` while unloaded.
    fn resolved(&self, route_key: &str) -> Option<Result<Arc<RouteValidator>, MessageError>> {
        match self {
            Self::Unloaded => None,
            Self::Loaded(v) | Self::Fallback(v) => Some(Ok(Arc::clone(v))),
            Self::Rejected => Some(Err(MessageError::ValidatorUnavailable {
                route_key: route_key.to_owned(),
            })),
        }
    }
}

struct Entry {
    path: PathBuf,
    slot: RwLock<Slot>,
}

/// Validators for every schema route of one manifest.
pub struct ValidatorRegistry {
    policy: ValidatorFailurePolicy,
    entries: HashMap<String, Entry>,
}

impl ValidatorRegistry {
    /// One unloaded entry per route with a schema; artifacts live in `dir`.
    pub fn from_manifest(
        manifest: &RouteManifest,
        dir: &Path,
        policy: ValidatorFailurePolicy,
    ) -> Self {
        let entries = manifest
            .schema_routes()
            .map(|(route_key, _)| {
                let entry = Entry {
                    path: dir.join(artifact_file_name(route_key)),
                    slot: RwLock::new(Slot::Unloaded),
                };
                (route_key.to_owned(), entry)
            })
            .collect();
        Self { policy, entries }
    }

    /// Failure policy in effect.
    pub fn policy(&self) -> ValidatorFailurePolicy {
        self.policy
    }

    /// Current state of a route's entry, `None` for routes without a schema.
    pub fn state(&self, route_key: &str) -> Option<ValidatorState> {
        self.entries.get(route_key).map(|e| e.slot.read().state())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no route has a schema.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validator for `route_key`, loading its artifact on first use.
    pub async fn get(&self, route_key: &str) -> Result<Arc<RouteValidator>, MessageError> {
        let Some(entry) = self.entries.get(route_key) else {
            return Err(MessageError::Unexpected {
                message: format!("no validator registered for route '{route_key}'"),
            });
        };

        if let Some(resolved) = entry.slot.read().resolved(route_key) {
            return resolved;
        }

        // no lock is held across the read
        let loaded = load_validator(&entry.path, route_key).await;
        let candidate = match loaded {
            Ok(validator) => {
                debug!(route_key, path = %entry.path.display(), "loaded validator");
                Slot::Loaded(Arc::new(RouteValidator::Compiled(validator)))
            }
            Err(err) => {
                error!(
                    route_key,
                    path = %entry.path.display(),
                    error = %err,
                    "error loading validator"
                );
                counter!(WS_VALIDATOR_FALLBACKS_TOTAL, "route_key" => route_key.to_owned())
                    .increment(1);
                match self.policy {
                    ValidatorFailurePolicy::Open => {
                        warn!(
                            route_key,
                            "body validation disabled for route, installing permissive validator"
                        );
                        Slot::Fallback(Arc::new(RouteValidator::Permissive))
                    }
                    ValidatorFailurePolicy::Closed => {
                        warn!(
                            route_key,
                            "rejecting messages for route without a validator"
                        );
                        Slot::Rejected
                    }
                }
            }
        };

        let mut slot = entry.slot.write();
        if matches!(*slot, Slot::Unloaded) {
            *slot = candidate;
        }
        slot.resolved(route_key).unwrap_or_else(|| {
            Err(MessageError::Unexpected {
                message: format!("validator for route '{route_key}' left unloaded"),
            })
        })
    }

    /// Load every unloaded entry concurrently.
    ///
    /// Failures settle into fallback/rejected states exactly as lazy loads do.
    pub async fn preload(&self) {
        let _ = join_all(self.entries.keys().map(|route_key| self.get(route_key))).await;
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("policy", &self.policy)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Read an artifact and compile its schema.
pub async fn load_validator(path: &Path, route_key: &str) -> Result<Validator, ValidatorLoadError> {
    let bytes = tokio::fs::read(path).await?;
    let artifact: CompiledArtifact = serde_json::from_slice(&bytes)?;
    if artifact.format != ARTIFACT_FORMAT_VERSION {
        return Err(ValidatorLoadError::FormatVersion {
            found: artifact.format,
        });
    }
    if artifact.route_key != route_key {
        return Err(ValidatorLoadError::RouteKeyMismatch {
            expected: route_key.to_owned(),
            found: artifact.route_key,
        });
    }
    jsonschema::validator_for(&artifact.schema)
        .map_err(|e| ValidatorLoadError::Schema(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
