//! JWT validation against signature, key-set and encryption trusts.
//!
//! - Parses compact tokens into unsecured, signed or encrypted variants
//! - Verifies signatures against static keys and cached remote key sets
//! - Decrypts direct-encrypted tokens and verifies the nested signed token
//! - Applies a chain of claim policies
//!
//! Validation never fails loudly: [`JwtValidator::validate`] returns `None`
//! for every rejected token.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod encryption;
pub mod error;
pub mod jwks;
pub mod jwt;
pub mod observability;
pub mod signature;
pub mod validator;

pub use config::{Config, ConfigError};
pub use context::ValidationContext;
pub use encryption::{DirectEncryption, EncryptionConfiguration};
pub use error::{ClaimsError, DecryptError, KeySetError, ParseError, ValidationError, VerifyError};
pub use jwks::{HttpKeySetFetcher, Jwk, Jwks, JwksSignature, KeySetFetcher, KeysPublisher};
pub use jwt::{ClaimsSet, SignedToken, Token, ValidatedToken};
pub use observability::{LogFormat, TracingConfig, ValidationMetrics, init_tracing};
pub use signature::{KeySignature, SignatureConfiguration, SignatureVerifier};
pub use validator::{ClaimsValidator, JwtValidator, ValidatorConfig};
