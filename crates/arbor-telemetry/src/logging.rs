//! Structured logging to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting `RUST_LOG` first and the configured log level otherwise.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|_| TelemetryError::InvalidFilter(config.log_level.clone())),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A route table file has been loaded and published.
    pub const ROUTES_LOADED: &str = "routes_loaded";

    /// A new router snapshot replaced the previous one.
    pub const ROUTES_RELOADED: &str = "routes_reloaded";

    /// A reload was rejected; the previous snapshot stays active.
    pub const RELOAD_FAILED: &str = "reload_failed";

    /// A route was switched on or off at runtime.
    pub const ROUTE_TOGGLED: &str = "route_toggled";

    /// The route file watcher started.
    pub const WATCHING: &str = "watching";

    /// A request was resolved.
    pub const REQUEST_RESOLVED: &str = "request_resolved";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_routes_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTES_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_routes_reloaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTES_RELOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_reload_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::RELOAD_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_toggled {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTE_TOGGLED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_watching {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::WATCHING,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_request_resolved {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::REQUEST_RESOLVED,
            $($field)*
        )
    };
}
