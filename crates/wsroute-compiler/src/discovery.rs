//! Locating and reading per-function route files.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use wsroute_core::Violation;
use wsroute_core::constants::function_name_from_route_file;

use crate::errors::{CompileError, Result};

/// A `<function>.websocket.json` file found in the functions directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteFile {
    /// Function the routes belong to.
    pub function: String,
    /// File name, used in error reports.
    pub file_name: String,
    /// Full path.
    pub path: PathBuf,
}

/// List route files in `functions_dir`, sorted by function name.
///
/// A missing directory yields an empty list.
pub async fn discover_route_files(functions_dir: &Path) -> Result<Vec<RouteFile>> {
    let exists = tokio::fs::try_exists(functions_dir)
        .await
        .map_err(|e| CompileError::io("inspect", functions_dir, e))?;
    if !exists {
        debug!(
            dir = %functions_dir.display(),
            "functions directory not found, nothing to compile"
        );
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(functions_dir)
        .await
        .map_err(|e| CompileError::io("read", functions_dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CompileError::io("read", functions_dir, e))?
    {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(function) = function_name_from_route_file(&file_name) {
            files.push(RouteFile {
                function: function.to_owned(),
                path: entry.path(),
                file_name,
            });
        }
    }

    files.sort_by(|a, b| a.function.cmp(&b.function));
    debug!(count = files.len(), "discovered route files");
    Ok(files)
}

/// Read and parse one route file.
///
/// Unreadable or unparseable files come back as a root-level violation so
/// they are reported together with every other malformed file.
pub async fn read_route_document(file: &RouteFile) -> std::result::Result<Value, Violation> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| Violation::new("", format!("failed to read file: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| Violation::new("", format!("invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover_route_files(&dir.path().join("absent")).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn only_route_files_are_listed_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["game.websocket.json", "chat.websocket.json", "chat.ts", "notes.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let files = discover_route_files(dir.path()).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.function.as_str()).collect();
        assert_eq!(names, vec!["chat", "game"]);
        assert_eq!(files[0].file_name, "chat.websocket.json");
    }

    #[tokio::test]
    async fn unparseable_file_becomes_root_violation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.websocket.json");
        std::fs::write(&path, "{ nope").unwrap();
        let file = RouteFile {
            function: "chat".into(),
            file_name: "chat.websocket.json".into(),
            path,
        };
        let violation = read_route_document(&file).await.unwrap_err();
        assert_eq!(violation.path, "");
        assert!(violation.message.starts_with("invalid JSON"));
    }
}
