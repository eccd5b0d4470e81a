//! Wire types for one invocation: the inbound message, the validated message
//! handed to handlers, and the response returned to the host.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Connection details supplied by the host platform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMetadata {
    /// Host-assigned connection identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// Any other host-provided fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message as it arrives at the process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Route key selecting the handler and body schema.
    pub route_key: String,
    /// Raw payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
    /// Connection details.
    #[serde(default)]
    pub connection_metadata: ConnectionMetadata,
}

impl IncomingMessage {
    /// Create a message with a body and no connection metadata.
    pub fn new(route_key: impl Into<String>, raw_body: impl Into<String>) -> Self {
        Self {
            route_key: route_key.into(),
            raw_body: Some(raw_body.into()),
            connection_metadata: ConnectionMetadata::default(),
        }
    }

    /// Raw payload, with an absent body read as `""`.
    pub fn raw_body_or_empty(&self) -> &str {
        self.raw_body.as_deref().unwrap_or("")
    }
}

/// A message whose body has been parsed and validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    /// Route key the message was resolved to.
    pub route_key: String,
    /// Validated body; `None` when the route declares no schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ParsedMessage {
    /// Deserialize the validated body into a concrete type.
    pub fn body_as<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.body.clone().map(serde_json::from_value)
    }
}

/// Response returned to the host for one message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Status code.
    pub status_code: u16,
    /// Response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Response {
    /// Status-only response.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: None,
            body: None,
        }
    }

    /// Response with a JSON body and `Content-Type: application/json`.
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self::new(status_code)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string())
    }

    /// Add or replace a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self
            .headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Parse the body as JSON, if there is one.
    pub fn json_body(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}
