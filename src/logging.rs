//! Logging and tracing infrastructure for tbt.
//!
//! Structured logging via the tracing crate with env-filter support.
//! The subscriber is installed once; later calls are no-ops, so the CLI
//! and tests can both call in without coordination.

use std::sync::Once;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

static INIT: Once = Once::new();

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber with human-readable output.
///
/// `default_level` is used when `RUST_LOG` is unset (the CLI passes
/// "warn", or "debug" with `--verbose`). Subsequent calls are ignored.
pub fn init_tracing(default_level: &str) {
    let filter = env_filter(default_level);
    INIT.call_once(|| {
        let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json(default_level: &str) {
    let filter = env_filter(default_level);
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    });
}
