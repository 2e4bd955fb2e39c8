use std::fmt;
use std::sync::Arc;

use crate::encryption::EncryptionConfiguration;
use crate::signature::SignatureConfiguration;
use crate::validator::claims::ClaimsValidator;

/// Immutable set of trusts and claim policies shared by all validations.
///
/// Built once with [`ValidatorConfig::builder`]; there are no mutators.
#[derive(Clone, Default)]
pub struct ValidatorConfig {
    signatures: Vec<SignatureConfiguration>,
    encryptions: Vec<Arc<dyn EncryptionConfiguration>>,
    claims_validators: Vec<Arc<dyn ClaimsValidator>>,
}

impl ValidatorConfig {
    /// Starts an empty builder
    #[must_use]
    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder::default()
    }

    /// Signature trusts in registration order
    #[must_use]
    pub fn signatures(&self) -> &[SignatureConfiguration] {
        &self.signatures
    }

    /// Encryption trusts in registration order
    #[must_use]
    pub fn encryptions(&self) -> &[Arc<dyn EncryptionConfiguration>] {
        &self.encryptions
    }

    /// Claim policies in registration order
    #[must_use]
    pub fn claims_validators(&self) -> &[Arc<dyn ClaimsValidator>] {
        &self.claims_validators
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("signatures", &self.signatures)
            .field("encryptions", &self.encryptions.len())
            .field("claims_validators", &self.claims_validators.len())
            .finish()
    }
}

/// Builder for [`ValidatorConfig`].
#[derive(Default)]
pub struct ValidatorConfigBuilder {
    signatures: Vec<SignatureConfiguration>,
    encryptions: Vec<Arc<dyn EncryptionConfiguration>>,
    claims_validators: Vec<Arc<dyn ClaimsValidator>>,
}

impl ValidatorConfigBuilder {
    /// Appends a signature trust
    #[must_use]
    pub fn signature(mut self, config: SignatureConfiguration) -> Self {
        self.signatures.push(config);
        self
    }

    /// Appends several signature trusts
    #[must_use]
    pub fn signatures(mut self, configs: impl IntoIterator<Item = SignatureConfiguration>) -> Self {
        self.signatures.extend(configs);
        self
    }

    /// Appends an encryption trust
    #[must_use]
    pub fn encryption(mut self, config: impl EncryptionConfiguration + 'static) -> Self {
        self.encryptions.push(Arc::new(config));
        self
    }

    /// Appends a shared encryption trust
    #[must_use]
    pub fn shared_encryption(mut self, config: Arc<dyn EncryptionConfiguration>) -> Self {
        self.encryptions.push(config);
        self
    }

    /// Appends a claim policy
    #[must_use]
    pub fn claims_validator(mut self, validator: impl ClaimsValidator + 'static) -> Self {
        self.claims_validators.push(Arc::new(validator));
        self
    }

    /// Appends a shared claim policy
    #[must_use]
    pub fn shared_claims_validator(mut self, validator: Arc<dyn ClaimsValidator>) -> Self {
        self.claims_validators.push(validator);
        self
    }

    /// Freezes the configuration
    #[must_use]
    pub fn build(self) -> ValidatorConfig {
        ValidatorConfig {
            signatures: self.signatures,
            encryptions: self.encryptions,
            claims_validators: self.claims_validators,
        }
    }
}
