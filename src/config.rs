//! Environment configuration with validation.
//!
//! Builds a [`ValidatorConfig`] with one key-set trust per JWKS URL and the
//! built-in claim validators selected by the environment.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::error::KeySetError;
use crate::jwks::{HttpKeySetFetcher, JwksSignature, KeySetFetcher};
use crate::observability::{LogFormat, TracingConfig};
use crate::signature::SignatureConfiguration;
use crate::validator::{
    AudienceValidator, ExpirationValidator, IssuerValidator, NotBeforeValidator, RequiredClaimsValidator,
    ValidatorConfig,
};

/// Key types a key set may be restricted to
const KEY_TYPES: &[&str] = &["RSA", "EC", "OKP"];

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable name
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid TTL value
    #[error("Invalid TTL: must be greater than 0")]
    InvalidTtl,

    /// Invalid timeout value
    #[error("Invalid timeout for {0}: must be greater than 0")]
    InvalidTimeout(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Validator configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// JWKS endpoints, one trust each, in order
    pub jwks_urls: Vec<Url>,
    /// JWKS cache TTL in seconds (must be > 0)
    pub jwks_cache_ttl_seconds: u64,
    /// Only use keys of this type
    pub jwks_key_type: Option<String>,
    /// JWKS fetch timeout in seconds (must be > 0)
    pub jwks_fetch_timeout_secs: u64,
    /// Expected `iss`
    pub issuer: Option<String>,
    /// Accepted `aud` values
    pub audiences: Vec<String>,
    /// Claims every token must carry
    pub required_claims: Vec<String>,
    /// Allowed clock skew for `exp`/`nbf`
    pub clock_skew_seconds: u64,
    /// Check `exp` and `nbf`
    pub validate_expiration: bool,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables (and `.env`) with validation.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable or invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let config = Self {
            jwks_urls: vars.url_list("JWKS_URLS")?,
            jwks_cache_ttl_seconds: vars.parse("JWKS_CACHE_TTL", 300)?,
            jwks_key_type: vars.get("JWKS_KEY_TYPE").filter(|s| !s.is_empty()),
            jwks_fetch_timeout_secs: vars.parse("JWKS_FETCH_TIMEOUT", 10)?,
            issuer: vars.get("JWT_ISSUER").filter(|s| !s.is_empty()),
            audiences: vars.list("JWT_AUDIENCE"),
            required_claims: vars.list("JWT_REQUIRED_CLAIMS"),
            clock_skew_seconds: vars.parse("JWT_CLOCK_SKEW", 60)?,
            validate_expiration: vars.parse("JWT_VALIDATE_EXPIRATION", true)?,
            log_level: vars.get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: vars.parse("LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwks_urls.is_empty() {
            return Err(ConfigError::MissingRequired("JWKS_URLS".to_string()));
        }
        if self.jwks_cache_ttl_seconds == 0 {
            return Err(ConfigError::InvalidTtl);
        }
        if self.jwks_fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("JWKS_FETCH_TIMEOUT".to_string()));
        }
        if let Some(ref kty) = self.jwks_key_type {
            if !KEY_TYPES.contains(&kty.as_str()) {
                return Err(ConfigError::ParseError {
                    name: "JWKS_KEY_TYPE".to_string(),
                    reason: format!("expected one of {}", KEY_TYPES.join(", ")),
                });
            }
        }
        Ok(())
    }

    /// JWKS cache TTL
    #[must_use]
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_seconds)
    }

    /// JWKS fetch timeout
    #[must_use]
    pub fn jwks_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_fetch_timeout_secs)
    }

    /// Clock skew leeway
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew_seconds)
    }

    /// HTTP fetcher with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError::Client`] if the HTTP client cannot be built.
    pub fn http_fetcher(&self) -> Result<HttpKeySetFetcher, KeySetError> {
        HttpKeySetFetcher::new(self.jwks_fetch_timeout())
    }

    /// One key-set trust per JWKS URL plus the configured claim validators.
    #[must_use]
    pub fn validator_config(&self, fetcher: Arc<dyn KeySetFetcher>) -> ValidatorConfig {
        let signatures = self.jwks_urls.iter().map(|url| {
            let jwks = JwksSignature::new(url.clone(), Arc::clone(&fetcher)).with_ttl(self.jwks_cache_ttl());
            let jwks = match self.jwks_key_type {
                Some(ref kty) => jwks.with_key_type(kty.clone()),
                None => jwks,
            };
            SignatureConfiguration::key_set(jwks)
        });

        let mut builder = ValidatorConfig::builder().signatures(signatures);
        if self.validate_expiration {
            builder = builder
                .claims_validator(ExpirationValidator::new(self.clock_skew()))
                .claims_validator(NotBeforeValidator::new(self.clock_skew()));
        }
        if let Some(ref issuer) = self.issuer {
            builder = builder.claims_validator(IssuerValidator::new(issuer.clone()));
        }
        if !self.audiences.is_empty() {
            builder = builder.claims_validator(AudienceValidator::new(self.audiences.iter().cloned()));
        }
        if !self.required_claims.is_empty() {
            builder = builder.claims_validator(RequiredClaimsValidator::new(self.required_claims.iter().cloned()));
        }
        builder.build()
    }

    /// Tracing setup matching the log settings
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let format = if self.log_json { LogFormat::Json } else { LogFormat::Text };
        TracingConfig::new(self.log_level.clone(), format)
    }
}

/// Typed access to a variable source.
struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    /// Parse a variable with a default value.
    fn parse<T: std::str::FromStr>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Parse a comma-separated list, skipping empty entries.
    fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parse a comma-separated list of URLs.
    fn url_list(&self, name: &str) -> Result<Vec<Url>, ConfigError> {
        self.list(name)
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
                    field: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}
