//! # Structured Logging
//!
//! JSON-formatted tracing output to stdout, with the level taken from
//! configuration and overridable per-target through `RUST_LOG`.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber.
///
/// Idempotent: repeated calls (e.g. from tests) are no-ops after the first.
/// An unrecognized `log_level` falls back to `info` with a stderr notice,
/// mirroring how the rest of startup treats soft misconfiguration.
pub fn init_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => log_level.to_lowercase(),
        other => {
            eprintln!("Unknown log level: {other} (using default: info)");
            "info".to_string()
        }
    };

    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.clone()));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false),
            )
            .init();
    });
}
