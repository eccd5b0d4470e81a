//! Runtime error kinds and their mapping to responses.
//!
//! Per-message failures are [`MessageError`] values and are turned into a
//! [`Response`] at exactly one place, [`MessageError::into_response`].
//! [`InitializationError`] is different: it means the deployment is broken
//! and is returned to the host instead of being answered.

use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;
use wsroute_core::{Response, Violation};

/// Error code for an unmatched route key.
pub const ROUTE_NOT_FOUND: &str = "ROUTE_NOT_FOUND";
/// Error code for parse or schema failures.
pub const BAD_REQUEST: &str = "BAD_REQUEST";
/// Error code for a route whose validator could not be loaded (fail-closed).
pub const VALIDATOR_UNAVAILABLE: &str = "VALIDATOR_UNAVAILABLE";
/// Error code for anything else.
pub const UNEXPECTED: &str = "UNEXPECTED";

/// Error returned by route handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Per-message errors
// ─────────────────────────────────────────────────────────────────────────────

/// A failure that ends processing of one message.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The manifest has no entry for the route key.
    #[error("No route defined for {route_key}")]
    RouteNotFound {
        /// The unmatched key.
        route_key: String,
    },

    /// The body could not be parsed or violates the route schema.
    #[error("Invalid Request Body")]
    BadRequest {
        /// Every violation found.
        violations: Vec<Violation>,
    },

    /// The route's validator failed to load and the policy is fail-closed.
    #[error("validator for route '{route_key}' is unavailable")]
    ValidatorUnavailable {
        /// Affected route.
        route_key: String,
    },

    /// Any other failure. Details are logged, never returned.
    #[error("{message}")]
    Unexpected {
        /// Internal description.
        message: String,
    },
}

impl MessageError {
    /// Machine-readable code, used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => ROUTE_NOT_FOUND,
            Self::BadRequest { .. } => BAD_REQUEST,
            Self::ValidatorUnavailable { .. } => VALIDATOR_UNAVAILABLE,
            Self::Unexpected { .. } => UNEXPECTED,
        }
    }

    /// Status code of the response this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RouteNotFound { .. } => 404,
            Self::BadRequest { .. } => 400,
            Self::ValidatorUnavailable { .. } | Self::Unexpected { .. } => 500,
        }
    }

    /// Convert into the response sent back for the message.
    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::RouteNotFound { .. } => {
                Response::json(status, &json!({ "message": self.to_string() }))
            }
            Self::BadRequest { ref violations } => Response::json(
                status,
                &json!({ "message": self.to_string(), "errors": violations }),
            ),
            Self::ValidatorUnavailable { .. } | Self::Unexpected { .. } => Response::new(status),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Deployment errors
// ─────────────────────────────────────────────────────────────────────────────

/// The deployment is missing or has a broken manifest.
///
/// Surfaces on first access and is never converted into a per-message
/// response.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// No manifest at the expected path.
    #[error("Found no routes at {}", .path.display())]
    ManifestMissing {
        /// Expected manifest path.
        path: PathBuf,
    },

    /// The manifest exists but could not be read.
    #[error("failed to read routes at {}: {source}", .path.display())]
    ManifestUnreadable {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a valid route mapping.
    #[error("Invalid routes configuration in {}: {source}", .path.display())]
    ManifestInvalid {
        /// Manifest path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Why a validator artifact could not be turned into a validator.
#[derive(Debug, Error)]
pub enum ValidatorLoadError {
    /// Artifact missing or unreadable.
    #[error("failed to read validator artifact: {0}")]
    Io(#[from] std::io::Error),
    /// Artifact is not valid JSON or has the wrong shape.
    #[error("corrupt validator artifact: {0}")]
    Json(#[from] serde_json::Error),
    /// Artifact was written by an incompatible compiler.
    #[error("unsupported validator artifact format {found}")]
    FormatVersion {
        /// Format found in the artifact.
        found: u32,
    },
    /// Artifact belongs to another route.
    #[error("validator artifact is for route '{found}', expected '{expected}'")]
    RouteKeyMismatch {
        /// Route being loaded.
        expected: String,
        /// Route recorded in the artifact.
        found: String,
    },
    /// Embedded schema does not compile.
    #[error("validator schema does not compile: {0}")]
    Schema(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
