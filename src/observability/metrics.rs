//! Validation metrics
//!
//! Outcome labels are the stable [`ValidationError::label`] values plus
//! `accepted`; they never carry token or key material.

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

use crate::error::ValidationError;

const NAMESPACE: &str = "token_validator";

/// Outcome label for accepted tokens
pub const OUTCOME_ACCEPTED: &str = "accepted";

/// Prometheus metrics for the validator
#[derive(Clone)]
pub struct ValidationMetrics {
    /// Validations by token kind and outcome
    pub validations: CounterVec,
    /// Key sets evicted because they expired
    pub key_set_evictions: Counter,
    /// Validation latency by token kind
    pub latency: HistogramVec,
}

impl ValidationMetrics {
    /// Creates the metrics and registers them on `registry`
    ///
    /// # Errors
    ///
    /// Returns a [`prometheus::Error`] if a metric is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let validations = CounterVec::new(
            Opts::new("validations_total", "Total token validations").namespace(NAMESPACE),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(validations.clone()))?;

        let key_set_evictions = Counter::with_opts(
            Opts::new("key_set_evictions_total", "Expired key sets evicted before verification")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(key_set_evictions.clone()))?;

        let latency = HistogramVec::new(
            HistogramOpts::new("validation_latency_seconds", "Token validation latency in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["kind"],
        )?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            validations,
            key_set_evictions,
            latency,
        })
    }

    /// Records a validation result
    pub fn record_outcome(&self, kind: &str, outcome: Result<(), ValidationError>, seconds: f64) {
        let label = match outcome {
            Ok(()) => OUTCOME_ACCEPTED,
            Err(e) => e.label(),
        };
        self.validations.with_label_values(&[kind, label]).inc();
        self.latency.with_label_values(&[kind]).observe(seconds);
    }

    /// Records an eviction
    pub fn record_eviction(&self) {
        self.key_set_evictions.inc();
    }
}
