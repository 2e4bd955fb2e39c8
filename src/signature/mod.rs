//! Signature trust configurations.
//!
//! A [`SignatureConfiguration`] is either a fixed key or a remote key set.
//! The validator and the ranker match on the variant: only key sets carry
//! cache state that ranking may inspect.

pub mod key;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VerifyError;
use crate::jwks::JwksSignature;
use crate::jwt::SignedToken;

pub use key::KeySignature;

/// Verifies signatures of signed tokens.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Checks whether the verifier can handle the JWS algorithm
    fn supports(&self, algorithm: &str) -> bool;

    /// Verifies the token signature.
    ///
    /// `Ok(false)` and `Err(_)` both mean the token is not accepted by this
    /// verifier.
    async fn verify(&self, token: &SignedToken) -> Result<bool, VerifyError>;
}

/// One registered signature trust.
#[derive(Clone)]
pub enum SignatureConfiguration {
    /// Static key material
    Key(Arc<dyn SignatureVerifier>),
    /// Remote, cached key set
    KeySet(Arc<JwksSignature>),
}

impl SignatureConfiguration {
    /// Wraps a static verifier
    pub fn key(verifier: impl SignatureVerifier + 'static) -> Self {
        Self::Key(Arc::new(verifier))
    }

    /// Wraps a remote key set
    #[must_use]
    pub fn key_set(jwks: JwksSignature) -> Self {
        Self::KeySet(Arc::new(jwks))
    }

    /// The key set, when this trust is cache-backed
    #[must_use]
    pub fn as_key_set(&self) -> Option<&JwksSignature> {
        match self {
            Self::KeySet(jwks) => Some(jwks),
            Self::Key(_) => None,
        }
    }

    /// Checks algorithm support. Key sets may fetch if nothing is cached.
    pub async fn supports(&self, algorithm: &str) -> bool {
        match self {
            Self::Key(verifier) => verifier.supports(algorithm),
            Self::KeySet(jwks) => jwks.supports(algorithm).await,
        }
    }

    /// Verifies the token signature. Key sets may fetch if nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] when verification could not be carried out.
    pub async fn verify(&self, token: &SignedToken) -> Result<bool, VerifyError> {
        match self {
            Self::Key(verifier) => verifier.verify(token).await,
            Self::KeySet(jwks) => jwks.verify(token).await,
        }
    }
}

impl From<Arc<JwksSignature>> for SignatureConfiguration {
    fn from(jwks: Arc<JwksSignature>) -> Self {
        Self::KeySet(jwks)
    }
}

impl From<Arc<dyn SignatureVerifier>> for SignatureConfiguration {
    fn from(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self::Key(verifier)
    }
}

impl fmt::Debug for SignatureConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(_) => f.write_str("Key"),
            Self::KeySet(jwks) => f.debug_tuple("KeySet").field(jwks).finish(),
        }
    }
}
