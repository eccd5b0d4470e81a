//! Metric names recorded through the `metrics` facade.
//!
//! The runtime never installs a recorder; the host decides where metrics go.

/// Messages handled total (counter, labels: route_key).
pub const WS_MESSAGES_TOTAL: &str = "ws_messages_total";
/// Messages answered with an error total (counter, labels: route_key, error_type).
pub const WS_MESSAGE_ERRORS_TOTAL: &str = "ws_message_errors_total";
/// Message handling duration seconds (histogram, labels: route_key).
pub const WS_MESSAGE_DURATION_SECONDS: &str = "ws_message_duration_seconds";
/// Validator artifacts that failed to load (counter, labels: route_key).
pub const WS_VALIDATOR_FALLBACKS_TOTAL: &str = "ws_validator_fallbacks_total";
