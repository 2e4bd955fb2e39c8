//! Static-key signature verification with `jsonwebtoken`.

use std::str::FromStr;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use tracing::debug;

use crate::error::VerifyError;
use crate::jwks::Jwk;
use crate::jwt::SignedToken;
use crate::signature::SignatureVerifier;

/// Minimum HMAC secret length in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    fn accepts(self, algorithm: Algorithm) -> bool {
        use Algorithm::{ES256, ES384, EdDSA, HS256, HS384, HS512, PS256, PS384, PS512, RS256, RS384, RS512};

        match self {
            Self::Hmac => matches!(algorithm, HS256 | HS384 | HS512),
            Self::Rsa => matches!(algorithm, RS256 | RS384 | RS512 | PS256 | PS384 | PS512),
            Self::Ec => matches!(algorithm, ES256 | ES384),
            Self::Ed => algorithm == EdDSA,
        }
    }
}

/// Verifies signatures with one fixed key.
#[derive(Clone)]
pub struct KeySignature {
    key: DecodingKey,
    family: KeyFamily,
    algorithm: Option<Algorithm>,
}

impl KeySignature {
    fn with_family(key: DecodingKey, family: KeyFamily) -> Self {
        Self {
            key,
            family,
            algorithm: None,
        }
    }

    /// HMAC secret for HS256/HS384/HS512.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidKey`] for secrets shorter than
    /// [`MIN_SECRET_LENGTH`] bytes.
    pub fn secret(secret: &[u8]) -> Result<Self, VerifyError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(VerifyError::invalid_key(format!(
                "HMAC secret shorter than {MIN_SECRET_LENGTH} bytes"
            )));
        }
        Ok(Self::with_family(DecodingKey::from_secret(secret), KeyFamily::Hmac))
    }

    /// RSA public key in PEM form (RS* and PS*).
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidKey`] if the PEM cannot be decoded.
    pub fn rsa_pem(pem: &[u8]) -> Result<Self, VerifyError> {
        Ok(Self::with_family(DecodingKey::from_rsa_pem(pem)?, KeyFamily::Rsa))
    }

    /// EC public key in PEM form (ES256/ES384).
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidKey`] if the PEM cannot be decoded.
    pub fn ec_pem(pem: &[u8]) -> Result<Self, VerifyError> {
        Ok(Self::with_family(DecodingKey::from_ec_pem(pem)?, KeyFamily::Ec))
    }

    /// Ed25519 public key in PEM form (EdDSA).
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidKey`] if the PEM cannot be decoded.
    pub fn ed_pem(pem: &[u8]) -> Result<Self, VerifyError> {
        Ok(Self::with_family(DecodingKey::from_ed_pem(pem)?, KeyFamily::Ed))
    }

    /// Public key from a JWK, subject to the JWK strength rules.
    ///
    /// A declared `alg` on the JWK restricts the verifier to that algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidKey`] for unsupported, incomplete or weak keys.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, VerifyError> {
        let family = match jwk.kty.as_str() {
            "RSA" => KeyFamily::Rsa,
            "EC" => KeyFamily::Ec,
            "OKP" => KeyFamily::Ed,
            other => return Err(VerifyError::invalid_key(format!("unsupported key type {other}"))),
        };
        let key = jwk
            .decoding_key()
            .ok_or_else(|| VerifyError::invalid_key("unusable JWK"))?;

        let verifier = Self::with_family(key, family);
        match jwk.alg.as_deref() {
            Some(alg) => verifier.with_algorithm(alg),
            None => Ok(verifier),
        }
    }

    /// Restricts the verifier to exactly one algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::UnsupportedAlgorithm`] if the algorithm is
    /// unknown or does not fit the key.
    pub fn with_algorithm(mut self, algorithm: &str) -> Result<Self, VerifyError> {
        let parsed = Algorithm::from_str(algorithm).map_err(|_| VerifyError::unsupported(algorithm))?;
        if !self.family.accepts(parsed) {
            return Err(VerifyError::unsupported(algorithm));
        }
        self.algorithm = Some(parsed);
        Ok(self)
    }

    fn usable_algorithm(&self, algorithm: &str) -> Option<Algorithm> {
        let parsed = Algorithm::from_str(algorithm).ok()?;
        let allowed = match self.algorithm {
            Some(fixed) => fixed == parsed,
            None => self.family.accepts(parsed),
        };
        allowed.then_some(parsed)
    }
}

#[async_trait]
impl SignatureVerifier for KeySignature {
    fn supports(&self, algorithm: &str) -> bool {
        self.usable_algorithm(algorithm).is_some()
    }

    async fn verify(&self, token: &SignedToken) -> Result<bool, VerifyError> {
        let algorithm = self
            .usable_algorithm(token.algorithm())
            .ok_or_else(|| VerifyError::unsupported(token.algorithm()))?;

        let valid = jsonwebtoken::crypto::verify(
            token.signature(),
            token.signing_input().as_bytes(),
            &self.key,
            algorithm,
        )?;
        if !valid {
            debug!(alg = ?algorithm, "signature mismatch");
        }
        Ok(valid)
    }
}

impl std::fmt::Debug for KeySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySignature")
            .field("family", &self.family)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::Token;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn hs256_token(secret: &[u8]) -> SignedToken {
        let raw = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "alice"}),
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        match Token::parse(&raw) {
            Token::Signed(token) => token,
            other => panic!("expected signed token, got {}", other.kind()),
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            KeySignature::secret(b"short"),
            Err(VerifyError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_supports_by_family() {
        let key = KeySignature::secret(SECRET).unwrap();
        assert!(key.supports("HS256"));
        assert!(key.supports("HS512"));
        assert!(!key.supports("RS256"));
        assert!(!key.supports("none"));
    }

    #[test]
    fn test_fixed_algorithm() {
        let key = KeySignature::secret(SECRET).unwrap().with_algorithm("HS384").unwrap();
        assert!(key.supports("HS384"));
        assert!(!key.supports("HS256"));
        assert!(KeySignature::secret(SECRET).unwrap().with_algorithm("ES256").is_err());
    }

    #[tokio::test]
    async fn test_verify_hmac() {
        let key = KeySignature::secret(SECRET).unwrap();
        assert!(key.verify(&hs256_token(SECRET)).await.unwrap());

        let forged = hs256_token(b"ffffffffffffffffffffffffffffffff");
        assert!(!key.verify(&forged).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_unsupported_algorithm() {
        let key = KeySignature::secret(SECRET).unwrap().with_algorithm("HS512").unwrap();
        assert!(matches!(
            key.verify(&hs256_token(SECRET)).await,
            Err(VerifyError::UnsupportedAlgorithm { .. })
        ));
    }
}
