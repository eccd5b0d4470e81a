//! Build-time error types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use wsroute_core::Violation;

/// Every malformed route file and every violation found in it.
///
/// Built only after all files have been checked, so a single failing build
/// lists everything that needs fixing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StructuralConfigError {
    /// Route file name → violations, sorted by file name.
    pub files: BTreeMap<String, Vec<Violation>>,
}

impl StructuralConfigError {
    /// Total number of violations across all files.
    pub fn violation_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Whether no violations were recorded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl fmt::Display for StructuralConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error validating the route files:")?;
        for (file, violations) in &self.files {
            write!(f, "\n {file} has the following errors")?;
            for violation in violations {
                write!(f, "\n  {violation}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for StructuralConfigError {}

/// Functions declaring the route middleware without a route file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "the following functions use the {middleware} middleware but have no route file:{}",
    .functions.iter().map(|f| format!("\n {f}")).collect::<String>()
)]
pub struct ConsistencyError {
    /// `module/resource` of the middleware.
    pub middleware: String,
    /// Offending function names, sorted.
    pub functions: Vec<String>,
}

/// Errors returned by the compiler.
#[derive(Debug, Error)]
pub enum CompileError {
    /// One or more route files are malformed.
    #[error(transparent)]
    Structural(#[from] StructuralConfigError),

    /// Middleware wiring and route files disagree.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Filesystem failure outside route-file reading.
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The serverless template could not be parsed.
    #[error("invalid template {}: {source}", .path.display())]
    Template {
        /// Template path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Output serialization failed.
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        /// What was being serialized.
        what: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Invariant broken inside the compiler itself.
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    /// Shorthand for [`CompileError::Io`].
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_error_lists_every_file_and_violation() {
        let mut err = StructuralConfigError::default();
        let _ = err.files.insert(
            "chat.websocket.json".into(),
            vec![
                Violation::new("/send/parser", "\"xml\" is not one of"),
                Violation::new("/join", "not an object"),
            ],
        );
        let _ = err.files.insert(
            "game.websocket.json".into(),
            vec![Violation::new("", "invalid JSON")],
        );

        let text = err.to_string();
        for file in ["chat.websocket.json", "game.websocket.json"] {
            assert!(text.contains(&format!("{file} has the following errors")));
        }
        assert!(text.contains("at /send/parser"));
        assert!(text.contains("not an object at /join"));
        assert_eq!(err.violation_count(), 3);
    }

    #[test]
    fn consistency_error_names_functions() {
        let err = ConsistencyError {
            middleware: "wsroute/WsRouteMiddleware".into(),
            functions: vec!["chat".into(), "game".into()],
        };
        let text = err.to_string();
        assert!(text.contains("wsroute/WsRouteMiddleware"));
        assert!(text.contains("\n chat"));
        assert!(text.contains("\n game"));
    }

    #[test]
    fn io_error_names_path() {
        let err = CompileError::io(
            "create",
            "/out/chat",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "failed to create /out/chat: denied");
    }
}
