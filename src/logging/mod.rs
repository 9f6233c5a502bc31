// Logging module for structured logging using the tracing crate

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Default filter directive when neither an explicit filter nor `RUST_LOG`
/// is given.
pub const DEFAULT_FILTER: &str = "info";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event, for log aggregation systems
    Json,
}

/// Logging error types
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to initialize logging: {0}")]
    InitError(String),
}

/// Build the event filter.
///
/// An explicit `filter` wins, then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn build_filter(filter: Option<&str>) -> Result<EnvFilter, LoggingError> {
    match filter {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter {
                filter: directives.to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// Events go to stderr so that stdout stays free for command output such
/// as data URLs.
///
/// # Errors
///
/// Returns an error if the filter cannot be parsed or a global subscriber
/// is already installed.
///
/// # Examples
///
/// ```no_run
/// use paritymark::logging::{init_subscriber, LogFormat};
///
/// init_subscriber(LogFormat::Json, Some("paritymark=debug")).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(format: LogFormat, filter: Option<&str>) -> Result<(), LoggingError> {
    let env_filter = build_filter(filter)?;
    let registry = Registry::default().with(env_filter);

    let result = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| LoggingError::InitError(e.to_string()))
}
