//! Logging initialization for the host
//!
//! Respects the `RUST_LOG` environment variable, falls back to a filter from
//! configuration, and defaults to `info`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging for the host process.
///
/// `RUST_LOG` always takes precedence; the config filter applies when it is
/// unset; `info` is the final default.
pub fn init_logging(filter: Option<&str>) {
    let mut env_filter = EnvFilter::from_default_env();

    if std::env::var("RUST_LOG").is_err() {
        env_filter = match filter {
            Some(f) => EnvFilter::new(f),
            None => EnvFilter::new("info"),
        };
    }

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(env_filter)
        .init();
}

/// Initialize logging with JSON output for log aggregation systems.
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    let mut env_filter = EnvFilter::from_default_env();

    if std::env::var("RUST_LOG").is_err() {
        env_filter = match filter {
            Some(f) => EnvFilter::new(f),
            None => EnvFilter::new("info"),
        };
    }

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(env_filter)
        .init();
}
