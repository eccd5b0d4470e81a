//! # wsroute-runtime
//!
//! Runtime half of `wsroute`: resolves each incoming message's route key
//! against the deployed manifest, parses and validates its body, and hands it
//! to the registered handler.
//!
//! - [`RuntimeState`]: process-wide manifest and validator caches
//! - [`Pipeline`]: fail-fast route lookup, body parsing and schema validation
//! - [`Router`]: frozen route key to [`RouteHandler`] table, built with [`RouterBuilder`]
//! - [`App`]: the host entry point tying the two together
//!
//! Per-message failures become responses through [`MessageError::into_response`].
//! A missing or invalid manifest is an [`InitializationError`] and is returned
//! to the host instead.

#![deny(unsafe_code)]

pub mod app;
pub mod errors;
pub mod manifest;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod router;
pub mod state;
pub mod validators;

pub use app::App;
pub use errors::{HandlerError, InitializationError, MessageError, ValidatorLoadError};
pub use manifest::ManifestLoader;
pub use parser::parse_body;
pub use pipeline::{Pipeline, Validated};
pub use router::{HandlerFn, HandlerResult, RouteHandler, Router, RouterBuilder, handler_fn};
pub use state::RuntimeState;
pub use validators::{RouteValidator, ValidatorRegistry, ValidatorState};
