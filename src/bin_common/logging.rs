//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the given default directive applies.

use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Initialize tracing with the `info` default
pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_LOG_LEVEL);
}

/// Initialize tracing with a custom default filter, e.g. `"swansocket=debug"`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing_with_default(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .try_init();
}

/// One log line for a received event: the name, then the arguments as a JSON array
pub fn format_event(name: &str, args: &[Value]) -> String {
    format!("{} {}", name, Value::Array(args.to_vec()))
}
