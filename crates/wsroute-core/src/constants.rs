//! File layout and template keywords shared by build and runtime.

/// Package name.
pub const NAME: &str = "wsroute";

/// Suffix of a per-function route-definition file (`<function>.websocket.json`).
pub const ROUTE_FILE_SUFFIX: &str = ".websocket.json";

/// Directory holding the manifest and validator artifacts of one function.
pub const SCHEMAS_DIR: &str = "websocket-schemas";

/// Manifest file name inside [`SCHEMAS_DIR`].
pub const MANIFEST_FILE: &str = "routes.websocket.json";

/// Extension appended to every compiled validator artifact.
pub const ARTIFACT_EXTENSION: &str = ".validator.json";

/// Serverless template resource type for functions.
pub const FUNCTION_RESOURCE_TYPE: &str = "AWS::Serverless::Function";

/// `CodeUri` keyword carrying the function name and its middleware list.
pub const FUNCTION_CODE_KEYWORD: &str = "SOMOD::Function";

/// Strip [`ROUTE_FILE_SUFFIX`] from a file name, yielding the function name.
///
/// Returns `None` for files that are not route files or have an empty stem.
pub fn function_name_from_route_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(ROUTE_FILE_SUFFIX)
        .filter(|name| !name.is_empty())
}
