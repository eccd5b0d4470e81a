//! Per-message validation: route lookup, body parsing and schema check.

use std::sync::Arc;

use tracing::debug;
use wsroute_core::{IncomingMessage, ParsedMessage};

use crate::errors::{InitializationError, MessageError};
use crate::parser::parse_body;
use crate::state::RuntimeState;

/// Outcome of validating one message.
///
/// The outer `Err` is fatal for the process; the inner one is answered.
pub type Validated = Result<Result<ParsedMessage, MessageError>, InitializationError>;

/// Fail-fast validation of incoming messages against the manifest.
#[derive(Clone, Debug)]
pub struct Pipeline {
    state: Arc<RuntimeState>,
}

enum Failure {
    Fatal(InitializationError),
    Message(MessageError),
}

impl From<InitializationError> for Failure {
    fn from(err: InitializationError) -> Self {
        Self::Fatal(err)
    }
}

impl From<MessageError> for Failure {
    fn from(err: MessageError) -> Self {
        Self::Message(err)
    }
}

impl Pipeline {
    /// Pipeline over the given process state.
    pub fn new(state: Arc<RuntimeState>) -> Self {
        Self { state }
    }

    /// Shared state.
    pub fn state(&self) -> &Arc<RuntimeState> {
        &self.state
    }

    /// Resolve, parse and validate one message.
    ///
    /// Routes without a body schema pass with `body: None` and their payload
    /// is not parsed.
    pub async fn validate(&self, event: &IncomingMessage) -> Validated {
        match self.run(event).await {
            Ok(parsed) => Ok(Ok(parsed)),
            Err(Failure::Message(err)) => Ok(Err(err)),
            Err(Failure::Fatal(err)) => Err(err),
        }
    }

    async fn run(&self, event: &IncomingMessage) -> Result<ParsedMessage, Failure> {
        let route_key = event.route_key.as_str();
        let manifest = self.state.manifest().await?;

        let Some(definition) = manifest.get(route_key) else {
            return Err(MessageError::RouteNotFound {
                route_key: route_key.to_owned(),
            }
            .into());
        };

        if !definition.has_schema() {
            return Ok(ParsedMessage {
                route_key: route_key.to_owned(),
                body: None,
            });
        }

        let body = parse_body(definition.parser_mode(), event.raw_body_or_empty())?;
        let validator = self.state.validators().await?.get(route_key).await?;
        let violations = validator.violations(&body);
        if !violations.is_empty() {
            debug!(
                route_key,
                violations = violations.len(),
                "body failed validation"
            );
            return Err(MessageError::BadRequest { violations }.into());
        }

        Ok(ParsedMessage {
            route_key: route_key.to_owned(),
            body: Some(body),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
