//! Log output for the validator binary.

use tracing_subscriber::fmt;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Fallback directive when the configured one does not parse
const FALLBACK_DIRECTIVE: &str = "info";

/// Line format written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event, with the current span
    Json,
}

/// Subscriber settings derived from [`crate::Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub directives: String,
    /// Output format
    pub format: LogFormat,
}

impl TracingConfig {
    /// Settings with the given filter directives and format
    #[must_use]
    pub fn new(directives: impl Into<String>, format: LogFormat) -> Self {
        Self {
            directives: directives.into(),
            format,
        }
    }

    /// `RUST_LOG` wins over the configured directives.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.directives))
            .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
    }
}

/// Installs the global subscriber writing to stderr.
///
/// Stdout stays reserved for the validated claims.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());
    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::debug!(directives = %config.directives, format = ?config.format, "logging initialized");
    Ok(())
}
