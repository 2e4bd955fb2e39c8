use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClaimsError;

/// Claims decoded from a structurally accepted token.
///
/// Keys are kept in a sorted map. Registered claims get typed accessors;
/// everything else is reachable through [`ClaimsSet::get`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimsSet {
    claims: Map<String, Value>,
}

impl ClaimsSet {
    /// Decodes a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::Json`] for invalid JSON and
    /// [`ClaimsError::NotAnObject`] for any JSON value other than an object.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ClaimsError> {
        match serde_json::from_slice::<Value>(payload)? {
            Value::Object(claims) => Ok(Self { claims }),
            _ => Err(ClaimsError::NotAnObject),
        }
    }

    /// Raw claim value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Checks whether a claim is present and not null
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// String claim value
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Claim that may be a single string or an array of strings.
    ///
    /// Non-string array elements are skipped.
    #[must_use]
    pub fn string_list(&self, name: &str) -> Vec<&str> {
        match self.get(name) {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// NumericDate claim (seconds since the epoch, fractions truncated)
    #[must_use]
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let value = self.get(name)?;
        let seconds = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// `iss`
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.string("iss")
    }

    /// `sub`
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.string("sub")
    }

    /// `aud`
    #[must_use]
    pub fn audience(&self) -> Vec<&str> {
        self.string_list("aud")
    }

    /// `exp`
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.timestamp("exp")
    }

    /// `nbf`
    #[must_use]
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.timestamp("nbf")
    }

    /// `iat`
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("iat")
    }

    /// `jti`
    #[must_use]
    pub fn jwt_id(&self) -> Option<&str> {
        self.string("jti")
    }

    /// Iterates claims in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.claims.iter()
    }

    /// Number of claims
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Checks whether the set has no claims
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl From<Map<String, Value>> for ClaimsSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self { claims }
    }
}
