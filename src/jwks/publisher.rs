//! Publication of locally known public keys as a JWKS document.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::jwks::model::{Jwk, Jwks};

/// Document served when no keys are known
pub const EMPTY_KEYS: &str = r#"{"keys":[]}"#;

/// Source of public keys to publish.
pub trait JwkProvider: Send + Sync {
    /// Currently published keys
    fn keys(&self) -> Vec<Jwk>;
}

impl JwkProvider for Jwks {
    fn keys(&self) -> Vec<Jwk> {
        self.keys.clone()
    }
}

/// Renders the union of all providers' keys.
#[derive(Default, Clone)]
pub struct KeysPublisher {
    providers: Vec<Arc<dyn JwkProvider>>,
}

impl KeysPublisher {
    /// Creates a publisher without providers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider; keys are published in registration order
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn JwkProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Union of all provider keys
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: self.providers.iter().flat_map(|p| p.keys()).collect(),
        }
    }

    /// JSON document; `{"keys":[]}` when there is nothing to publish.
    #[must_use]
    pub fn to_json(&self) -> String {
        let jwks = self.jwks();
        if jwks.is_empty() {
            return EMPTY_KEYS.to_string();
        }
        serde_json::to_string(&jwks).unwrap_or_else(|_| EMPTY_KEYS.to_string())
    }
}

/// Current and previous signing keys.
///
/// After a rotation the previous generation stays published so tokens
/// signed just before it keep verifying for consumers.
#[derive(Default)]
pub struct RotatingKeys {
    current: RwLock<Jwks>,
    previous: RwLock<Jwks>,
}

impl RotatingKeys {
    /// Starts with a single current key
    #[must_use]
    pub fn new(key: Jwk) -> Self {
        let keys = Self::default();
        keys.current.write().add_key(key);
        keys
    }

    /// Makes `new_key` current and demotes the current generation.
    pub fn rotate(&self, new_key: Jwk) {
        let mut current = self.current.write();
        let mut previous = self.previous.write();

        info!(kid = ?new_key.kid, "rotating signing key");
        *previous = std::mem::take(&mut *current);
        current.add_key(new_key);
    }

    /// Key id of the current key
    #[must_use]
    pub fn current_key_id(&self) -> Option<String> {
        self.current.read().keys.first().and_then(|k| k.kid.clone())
    }
}

impl JwkProvider for RotatingKeys {
    fn keys(&self) -> Vec<Jwk> {
        let current = self.current.read();
        let previous = self.previous.read();
        current.keys.iter().chain(previous.keys.iter()).cloned().collect()
    }
}
