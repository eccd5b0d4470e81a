//! Host entry point: one incoming message in, one response out.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{error, instrument};
use wsroute_core::{IncomingMessage, Response};

use crate::errors::{InitializationError, MessageError};
use crate::metrics::{WS_MESSAGE_DURATION_SECONDS, WS_MESSAGE_ERRORS_TOTAL, WS_MESSAGES_TOTAL};
use crate::pipeline::Pipeline;
use crate::router::Router;
use crate::state::RuntimeState;

/// Validation pipeline plus handler table, ready to serve messages.
///
/// Construct once per process and call [`App::handle`] per invocation.
#[derive(Clone, Debug)]
pub struct App {
    pipeline: Pipeline,
    router: Router,
}

impl App {
    /// App over explicit state.
    pub fn new(state: Arc<RuntimeState>, router: Router) -> Self {
        Self {
            pipeline: Pipeline::new(state),
            router,
        }
    }

    /// App over state built from the process-wide settings.
    pub fn from_settings(router: Router) -> Self {
        Self::new(Arc::new(RuntimeState::from_settings()), router)
    }

    /// Shared state.
    pub fn state(&self) -> &Arc<RuntimeState> {
        self.pipeline.state()
    }

    /// Handler table.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handle one message.
    ///
    /// Every per-message failure is answered with a response. `Err` is
    /// returned only when the deployment itself is broken and should be
    /// surfaced to the host as an invocation failure.
    #[instrument(skip_all, fields(route_key = %event.route_key))]
    pub async fn handle(&self, event: IncomingMessage) -> Result<Response, InitializationError> {
        let route_key = event.route_key.clone();
        counter!(WS_MESSAGES_TOTAL, "route_key" => route_key.clone()).increment(1);
        let start = Instant::now();

        let outcome = match self.pipeline.validate(&event).await? {
            Ok(message) => self.router.dispatch(message, &event).await.map_err(|err| {
                error!(error = %err, "handler failed");
                MessageError::Unexpected {
                    message: err.to_string(),
                }
            }),
            Err(err) => Err(err),
        };

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                counter!(
                    WS_MESSAGE_ERRORS_TOTAL,
                    "route_key" => route_key.clone(),
                    "error_type" => err.code()
                )
                .increment(1);
                err.into_response()
            }
        };

        histogram!(WS_MESSAGE_DURATION_SECONDS, "route_key" => route_key)
            .record(start.elapsed().as_secs_f64());
        Ok(response)
    }
}
