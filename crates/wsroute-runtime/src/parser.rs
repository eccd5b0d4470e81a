//! Body parsing per declared parser mode.

use serde_json::{Map, Value};
use wsroute_core::{ParserMode, Violation};

use crate::errors::MessageError;

/// Convert a raw payload into a structured value.
///
/// - `text`: the raw string, unchanged
/// - `json`: parsed JSON; malformed input is a [`MessageError::BadRequest`]
/// - `formdata`: URL-encoded pairs as a flat object; a key that appears once
///   maps to a string, a repeated key to an array of its values in order
pub fn parse_body(mode: ParserMode, raw: &str) -> Result<Value, MessageError> {
    match mode {
        ParserMode::Text => Ok(Value::String(raw.to_owned())),
        ParserMode::Json => serde_json::from_str(raw).map_err(|e| MessageError::BadRequest {
            violations: vec![Violation::new("", format!("body is not valid JSON: {e}"))],
        }),
        ParserMode::Formdata => Ok(Value::Object(parse_form(raw))),
    }
}

fn parse_form(raw: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = Value::String(value.into_owned());
        match fields.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                let _ = fields.insert(key.into_owned(), value);
            }
        }
    }
    fields
}
