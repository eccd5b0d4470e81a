//! Route key to handler dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use wsroute_core::{IncomingMessage, ParsedMessage, Response};

use crate::errors::HandlerError;

/// What a handler returns; an `Err` is answered with a bare 500.
pub type HandlerResult = Result<Response, HandlerError>;

/// Trait implemented by every message handler.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Handle a validated message. `event` is the message as received.
    async fn handle(&self, message: ParsedMessage, event: &IncomingMessage) -> HandlerResult;
}

/// Handler backed by an async function or closure.
pub struct HandlerFn<F>(F);

/// Wrap an async closure as a [`RouteHandler`].
///
/// The closure receives its own copy of the raw event.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ParsedMessage, IncomingMessage) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> RouteHandler for HandlerFn<F>
where
    F: Fn(ParsedMessage, IncomingMessage) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, message: ParsedMessage, event: &IncomingMessage) -> HandlerResult {
        (self.0)(message, event.clone()).await
    }
}

/// Accumulates handlers before they are frozen into a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    handlers: HashMap<String, Arc<dyn RouteHandler>>,
}

impl RouterBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a route key.
    ///
    /// Registering the same key again replaces the earlier handler.
    #[must_use]
    pub fn register(
        mut self,
        route_key: impl Into<String>,
        handler: impl RouteHandler + 'static,
    ) -> Self {
        let route_key = route_key.into();
        if self.handlers.insert(route_key.clone(), Arc::new(handler)).is_some() {
            debug!(route_key, "replaced previously registered handler");
        }
        self
    }

    /// Freeze the table.
    pub fn build(self) -> Router {
        Router {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Immutable route key to handler table. Cheap to clone.
#[derive(Clone)]
pub struct Router {
    handlers: Arc<HashMap<String, Arc<dyn RouteHandler>>>,
}

impl Router {
    /// Start building a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Invoke the handler for `message.route_key`.
    ///
    /// The handler's result is returned as is. Without a handler the answer
    /// is a 404 naming the key.
    pub async fn dispatch(&self, message: ParsedMessage, event: &IncomingMessage) -> HandlerResult {
        let Some(handler) = self.handlers.get(&message.route_key) else {
            let message = format!("No route handler defined for {}", message.route_key);
            return Ok(Response::json(404, &json!({ "message": message })));
        };
        handler.handle(message, event).await
    }

    /// Registered route keys (sorted).
    pub fn route_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether a handler is registered for the key.
    pub fn has_route(&self, route_key: &str) -> bool {
        self.handlers.contains_key(route_key)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("route_keys", &self.route_keys())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
