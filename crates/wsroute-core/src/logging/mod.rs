//! Structured logging with `tracing`.
//!
//! Library code only emits events through the `tracing` macros. Binaries and
//! host adapters call [`init_subscriber`] once at cold start; tests use
//! [`capture_logs`] to assert on emitted events.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `level` when set. Subsequent calls are
/// no-ops, so warm invocations can call this unconditionally. Returns whether
/// this call installed the subscriber.
pub fn init_subscriber(level: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    subscriber.try_init().is_ok()
}

/// Same as [`init_subscriber`] but emits one JSON object per line, which
/// serverless log collectors index by field.
pub fn init_json_subscriber(level: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json();

    subscriber.try_init().is_ok()
}
