//! Claims validation chain.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::context::ValidationContext;
use crate::jwt::ClaimsSet;

/// Policy check over a decoded claims set.
///
/// Implementations must not depend on anything but the claims, the context
/// and their own configuration.
pub trait ClaimsValidator: Send + Sync {
    /// Returns `true` if the claims satisfy this policy
    fn validate(&self, claims: &ClaimsSet, context: &ValidationContext) -> bool;
}

impl<F> ClaimsValidator for F
where
    F: Fn(&ClaimsSet, &ValidationContext) -> bool + Send + Sync,
{
    fn validate(&self, claims: &ClaimsSet, context: &ValidationContext) -> bool {
        self(claims, context)
    }
}

/// Conjunction of all validators; an empty chain accepts.
#[must_use]
pub fn validate_all(claims: &ClaimsSet, context: &ValidationContext, validators: &[Arc<dyn ClaimsValidator>]) -> bool {
    validators.iter().all(|v| v.validate(claims, context))
}

fn leeway_delta(leeway: Duration) -> TimeDelta {
    TimeDelta::from_std(leeway).unwrap_or(TimeDelta::MAX)
}

/// Rejects tokens whose `exp` lies in the past. Tokens without `exp` pass.
#[derive(Debug, Clone)]
pub struct ExpirationValidator {
    leeway: TimeDelta,
}

impl ExpirationValidator {
    /// Creates the validator with the allowed clock skew
    #[must_use]
    pub fn new(leeway: Duration) -> Self {
        Self {
            leeway: leeway_delta(leeway),
        }
    }

    fn check(&self, claims: &ClaimsSet, now: DateTime<Utc>) -> bool {
        let Some(expiration) = claims.expiration() else {
            return true;
        };
        let valid = expiration.checked_add_signed(self.leeway).is_none_or(|limit| now < limit);
        if !valid {
            debug!(exp = %expiration, "token expired");
        }
        valid
    }
}

impl ClaimsValidator for ExpirationValidator {
    fn validate(&self, claims: &ClaimsSet, _context: &ValidationContext) -> bool {
        self.check(claims, Utc::now())
    }
}

/// Rejects tokens used before `nbf`. Tokens without `nbf` pass.
#[derive(Debug, Clone)]
pub struct NotBeforeValidator {
    leeway: TimeDelta,
}

impl NotBeforeValidator {
    /// Creates the validator with the allowed clock skew
    #[must_use]
    pub fn new(leeway: Duration) -> Self {
        Self {
            leeway: leeway_delta(leeway),
        }
    }

    fn check(&self, claims: &ClaimsSet, now: DateTime<Utc>) -> bool {
        let Some(not_before) = claims.not_before() else {
            return true;
        };
        let valid = now.checked_add_signed(self.leeway).is_none_or(|shifted| shifted >= not_before);
        if !valid {
            debug!(nbf = %not_before, "token not yet valid");
        }
        valid
    }
}

impl ClaimsValidator for NotBeforeValidator {
    fn validate(&self, claims: &ClaimsSet, _context: &ValidationContext) -> bool {
        self.check(claims, Utc::now())
    }
}

/// Requires `iss` to equal the expected issuer.
#[derive(Debug, Clone)]
pub struct IssuerValidator {
    issuer: String,
}

impl IssuerValidator {
    /// Creates the validator
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self { issuer: issuer.into() }
    }
}

impl ClaimsValidator for IssuerValidator {
    fn validate(&self, claims: &ClaimsSet, _context: &ValidationContext) -> bool {
        let valid = claims.issuer() == Some(self.issuer.as_str());
        if !valid {
            debug!(iss = ?claims.issuer(), "issuer mismatch");
        }
        valid
    }
}

/// Requires `aud` to contain at least one accepted audience.
#[derive(Debug, Clone)]
pub struct AudienceValidator {
    audiences: Vec<String>,
}

impl AudienceValidator {
    /// Creates the validator
    #[must_use]
    pub fn new<I, S>(audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            audiences: audiences.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClaimsValidator for AudienceValidator {
    fn validate(&self, claims: &ClaimsSet, _context: &ValidationContext) -> bool {
        let valid = claims
            .audience()
            .iter()
            .any(|aud| self.audiences.iter().any(|accepted| accepted.as_str() == *aud));
        if !valid {
            debug!(aud = ?claims.audience(), "audience mismatch");
        }
        valid
    }
}

/// Requires every listed claim to be present and non-null.
#[derive(Debug, Clone)]
pub struct RequiredClaimsValidator {
    names: Vec<String>,
}

impl RequiredClaimsValidator {
    /// Creates the validator
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClaimsValidator for RequiredClaimsValidator {
    fn validate(&self, claims: &ClaimsSet, _context: &ValidationContext) -> bool {
        match self.names.iter().find(|name| !claims.contains(name)) {
            Some(missing) => {
                debug!(claim = %missing, "required claim missing");
                false
            }
            None => true,
        }
    }
}
