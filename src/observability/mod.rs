//! Logging and metrics.

pub mod metrics;
pub mod tracing_config;

pub use metrics::{OUTCOME_ACCEPTED, ValidationMetrics};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
