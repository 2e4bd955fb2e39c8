//! Token validation orchestrator
//!
//! Dispatches on the token variant, walks ranked trust candidates and gates
//! the result on the claims validators. Every rejection becomes `None`; the
//! reason is only visible in tracing and metrics.

pub mod claims;
pub mod config;
pub mod ranking;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::context::ValidationContext;
use crate::error::{DecryptError, ValidationError};
use crate::jwt::{EncryptedToken, SignedToken, Token, ValidatedToken};
use crate::observability::ValidationMetrics;

pub use claims::{
    AudienceValidator, ClaimsValidator, ExpirationValidator, IssuerValidator, NotBeforeValidator,
    RequiredClaimsValidator, validate_all,
};
pub use config::{ValidatorConfig, ValidatorConfigBuilder};
pub use ranking::{rank_encryptions, rank_signatures};

/// Validates tokens against a shared [`ValidatorConfig`].
///
/// Cheap to clone; clones share the configuration and its key-set caches.
#[derive(Clone)]
pub struct JwtValidator {
    config: Arc<ValidatorConfig>,
    metrics: Option<Arc<ValidationMetrics>>,
}

impl JwtValidator {
    /// Creates a validator owning `config`
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    /// Creates a validator over an already shared configuration
    #[must_use]
    pub fn from_shared(config: Arc<ValidatorConfig>) -> Self {
        Self { config, metrics: None }
    }

    /// Records outcomes and evictions on `metrics`
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<ValidationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Parses and validates a compact-serialized token.
    #[instrument(skip_all, fields(correlation_id = %context.correlation_id()))]
    pub async fn validate(&self, raw: &str, context: &ValidationContext) -> Option<ValidatedToken> {
        self.validate_token(Token::parse(raw), context).await
    }

    /// Validates an already parsed token.
    pub async fn validate_token(&self, token: Token, context: &ValidationContext) -> Option<ValidatedToken> {
        let started = Instant::now();
        let kind = token.kind();

        let result = self.evaluate(token, context).await;

        match &result {
            Ok(validated) => debug!(kind, sub = ?validated.subject(), "token accepted"),
            Err(e) => debug!(kind, reason = e.label(), "token rejected"),
        }
        if let Some(metrics) = &self.metrics {
            let outcome = result.as_ref().map(|_| ()).map_err(|e| *e);
            metrics.record_outcome(kind, outcome, started.elapsed().as_secs_f64());
        }

        result.ok()
    }

    /// Full validation with the internal rejection reason.
    async fn evaluate(&self, token: Token, context: &ValidationContext) -> Result<ValidatedToken, ValidationError> {
        let (claims, nested) = match &token {
            Token::Malformed => return Err(ValidationError::MalformedToken),
            Token::Unsecured(unsecured) => {
                if !self.config.signatures().is_empty() {
                    debug!("unsecured token while signature trusts are configured");
                    return Err(ValidationError::NoMatchingTrust);
                }
                (unsecured.claims(), None)
            }
            Token::Signed(signed) => {
                self.verify_signed(signed).await?;
                (signed.claims(), None)
            }
            Token::Encrypted(encrypted) => {
                let nested = self.decrypt(encrypted).await?;
                self.verify_signed(&nested).await?;
                (nested.claims(), Some(nested))
            }
        };

        let claims = claims.map_err(|e| {
            debug!(error = %e, "claims could not be decoded");
            ValidationError::ClaimRejected
        })?;

        if !validate_all(&claims, context, self.config.claims_validators()) {
            return Err(ValidationError::ClaimRejected);
        }

        Ok(ValidatedToken::new(token, nested, claims))
    }

    /// Tries ranked signature candidates until one accepts the token.
    async fn verify_signed(&self, token: &SignedToken) -> Result<(), ValidationError> {
        let candidates = rank_signatures(self.config.signatures(), token.algorithm(), token.key_id());

        for (rank, candidate) in candidates.into_iter().enumerate() {
            // expired key material is dropped so verify fetches fresh keys
            if let Some(jwks) = candidate.as_key_set() {
                if jwks.is_expired() && jwks.clear() {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_eviction();
                    }
                }
            }

            match candidate.verify(token).await {
                Ok(true) => {
                    debug!(rank, alg = token.algorithm(), "signature verified");
                    return Ok(());
                }
                Ok(false) => debug!(rank, "candidate did not accept signature"),
                Err(e) => debug!(rank, error = %e, "candidate could not verify"),
            }
        }

        Err(ValidationError::NoMatchingTrust)
    }

    /// Decrypts with the first ranked candidate that succeeds.
    async fn decrypt(&self, token: &EncryptedToken) -> Result<SignedToken, ValidationError> {
        let candidates = rank_encryptions(self.config.encryptions(), token.algorithm(), token.method());

        for (rank, candidate) in candidates.into_iter().enumerate() {
            match candidate.decrypt(token).await {
                Ok(nested) => return Ok(nested),
                Err(DecryptError::PayloadNotSigned) => {
                    debug!(rank, "decrypted payload is not a signed token");
                    return Err(ValidationError::NoMatchingTrust);
                }
                Err(e) => debug!(rank, error = %e, "candidate could not decrypt"),
            }
        }

        Err(ValidationError::NoMatchingTrust)
    }
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
