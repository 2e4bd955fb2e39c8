//! Request-scoped validation context.

use std::collections::HashMap;
use uuid::Uuid;

/// Request-scoped information handed, unmodified, to every claims validator.
///
/// The validator never interprets the attributes itself; they exist so that
/// callers can plug in policies that depend on the originating request
/// (expected nonce, tenant, client address and so on).
#[derive(Debug, Clone)]
pub struct ValidationContext {
    correlation_id: Uuid,
    attributes: HashMap<String, String>,
}

impl ValidationContext {
    /// Creates a context with a fresh correlation ID and no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            attributes: HashMap::new(),
        }
    }

    /// Uses an existing correlation ID, e.g. one propagated from the request.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Adds a request attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Correlation ID for tracing.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Looks up a request attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}
