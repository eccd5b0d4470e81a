//! # wsroute-core
//!
//! Shared vocabulary for the `wsroute` build-time compiler and runtime.
//!
//! - **Routes**: [`RouteDefinition`], [`ParserMode`] and the immutable [`RouteManifest`]
//! - **Messages**: [`IncomingMessage`] in, [`ParsedMessage`] to handlers, [`Response`] out
//! - **Violations**: [`Violation`] entries produced by schema checks
//! - **Artifacts**: deterministic validator file naming and the [`CompiledArtifact`] format
//! - **Logging**: `tracing` subscriber setup and in-memory capture for tests

#![deny(unsafe_code)]

pub mod artifact;
pub mod constants;
pub mod logging;
pub mod messages;
pub mod routes;
pub mod violation;

pub use artifact::{ARTIFACT_FORMAT_VERSION, CompiledArtifact, artifact_file_name};
pub use messages::{ConnectionMetadata, IncomingMessage, ParsedMessage, Response};
pub use routes::{ParserMode, RouteDefinition, RouteManifest};
pub use violation::Violation;
