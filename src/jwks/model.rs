//! JSON Web Key and Key Set documents.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Smallest accepted RSA modulus.
const MIN_RSA_MODULUS_BITS: usize = 2048;

/// EC curves strong enough to accept.
const ACCEPTED_EC_CURVES: &[&str] = &["P-256", "P-384", "P-521"];

/// JSON Web Key structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, EC, OKP)
    pub kty: String,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Key use (sig, enc)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// EC x coordinate, or OKP public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC y coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// EC or OKP curve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
}

impl Jwk {
    /// Creates an RSA signing key from base64url modulus and exponent.
    #[must_use]
    pub fn rsa(kid: impl Into<String>, n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: Some(kid.into()),
            key_use: Some("sig".to_string()),
            alg: None,
            n: Some(n.into()),
            e: Some(e.into()),
            x: None,
            y: None,
            crv: None,
        }
    }

    /// Sets the declared algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    /// Checks whether this key may verify signatures (`use` absent or `sig`).
    #[must_use]
    pub fn is_signing_key(&self) -> bool {
        self.key_use.as_deref().is_none_or(|u| u == "sig")
    }

    /// Checks whether this key can verify the given JWS algorithm.
    ///
    /// The algorithm must fit the key type and curve; a declared `alg`
    /// narrows that further to an exact match.
    #[must_use]
    pub fn supports_algorithm(&self, algorithm: &str) -> bool {
        self.is_signing_key()
            && self.fits_key_type(algorithm)
            && self.alg.as_deref().is_none_or(|declared| declared == algorithm)
    }

    /// False when the declared `alg` cannot be used with this key type,
    /// e.g. an EC key declaring `HS256`.
    #[must_use]
    pub fn has_consistent_algorithm(&self) -> bool {
        self.alg.as_deref().is_none_or(|declared| self.fits_key_type(declared))
    }

    fn fits_key_type(&self, algorithm: &str) -> bool {
        match self.kty.as_str() {
            "RSA" => matches!(
                algorithm,
                "RS256" | "RS384" | "RS512" | "PS256" | "PS384" | "PS512"
            ),
            "EC" => matches!(
                (self.crv.as_deref(), algorithm),
                (Some("P-256"), "ES256") | (Some("P-384"), "ES384")
            ),
            "OKP" => self.crv.as_deref() == Some("Ed25519") && algorithm == "EdDSA",
            _ => false,
        }
    }

    /// Converts this JWK to a DecodingKey.
    ///
    /// Returns `None` for incomplete, unsupported or too-weak keys.
    #[must_use]
    pub fn decoding_key(&self) -> Option<DecodingKey> {
        let kid = self.kid.as_deref().unwrap_or("-");
        match self.kty.as_str() {
            "RSA" => {
                let n = self.n.as_ref()?;
                let e = self.e.as_ref()?;

                if rsa_modulus_bits(n) < MIN_RSA_MODULUS_BITS {
                    warn!(kid = %kid, "RSA key too small, rejecting");
                    return None;
                }

                DecodingKey::from_rsa_components(n, e).ok()
            }
            "EC" => {
                let x = self.x.as_ref()?;
                let y = self.y.as_ref()?;
                let crv = self.crv.as_deref().unwrap_or("P-256");

                if !ACCEPTED_EC_CURVES.contains(&crv) {
                    warn!(kid = %kid, crv = %crv, "Weak EC curve, rejecting");
                    return None;
                }

                DecodingKey::from_ec_components(x, y).ok()
            }
            "OKP" => {
                let x = self.x.as_ref()?;
                if self.crv.as_deref() != Some("Ed25519") {
                    warn!(kid = %kid, "Unsupported OKP curve");
                    return None;
                }
                DecodingKey::from_ed_components(x).ok()
            }
            _ => {
                warn!(kty = %self.kty, "Unsupported key type");
                None
            }
        }
    }
}

/// Bit length of a base64url-encoded big-endian modulus, 0 if undecodable.
fn rsa_modulus_bits(n: &str) -> usize {
    URL_SAFE_NO_PAD
        .decode(n)
        .map(|bytes| {
            let significant = bytes.iter().skip_while(|b| **b == 0).count();
            let top = bytes.len() - significant;
            bytes.get(top).map_or(0, |first| significant * 8 - first.leading_zeros() as usize)
        })
        .unwrap_or(0)
}

/// JSON Web Key Set structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Jwks {
    /// List of keys
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Creates an empty key set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// Checks whether the set has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2048-bit modulus (342 base64url characters)
    fn strong_modulus() -> String {
        URL_SAFE_NO_PAD.encode([0xC5u8; 256])
    }

    #[test]
    fn test_rsa_algorithm_support() {
        let jwk = Jwk::rsa("key-1", strong_modulus(), "AQAB");
        assert!(jwk.supports_algorithm("RS256"));
        assert!(jwk.supports_algorithm("PS512"));
        assert!(!jwk.supports_algorithm("ES256"));
        assert!(!jwk.supports_algorithm("HS256"));
    }

    #[test]
    fn test_declared_algorithm_is_exact() {
        let jwk = Jwk::rsa("key-1", strong_modulus(), "AQAB").with_algorithm("RS384");
        assert!(jwk.supports_algorithm("RS384"));
        assert!(!jwk.supports_algorithm("RS256"));
    }

    #[test]
    fn test_encryption_keys_never_verify() {
        let mut jwk = Jwk::rsa("key-1", strong_modulus(), "AQAB");
        jwk.key_use = Some("enc".to_string());
        assert!(!jwk.supports_algorithm("RS256"));
    }

    #[test]
    fn test_ec_curve_selects_algorithm() {
        let jwk = Jwk {
            kty: "EC".to_string(),
            kid: Some("ec-1".to_string()),
            key_use: None,
            alg: None,
            n: None,
            e: None,
            x: Some("x".to_string()),
            y: Some("y".to_string()),
            crv: Some("P-384".to_string()),
        };
        assert!(jwk.supports_algorithm("ES384"));
        assert!(!jwk.supports_algorithm("ES256"));
    }

    #[test]
    fn test_weak_rsa_key_rejected() {
        let weak = Jwk::rsa("weak", URL_SAFE_NO_PAD.encode([0xC5u8; 128]), "AQAB");
        assert!(weak.decoding_key().is_none());
        assert!(Jwk::rsa("strong", strong_modulus(), "AQAB").decoding_key().is_some());
    }

    #[test]
    fn test_leading_zero_bytes_do_not_count() {
        let mut bytes = vec![0u8; 8];
        bytes.extend([0xC5u8; 250]);
        assert_eq!(rsa_modulus_bits(&URL_SAFE_NO_PAD.encode(bytes)), 2000);
    }

    #[test]
    fn test_modulus_bits_count_top_byte_precisely() {
        let mut short = vec![0x7Fu8];
        short.extend([0xC5u8; 255]);
        assert_eq!(rsa_modulus_bits(&URL_SAFE_NO_PAD.encode(&short)), 2047);
        assert!(Jwk::rsa("short", URL_SAFE_NO_PAD.encode(&short), "AQAB").decoding_key().is_none());

        let mut two = vec![0x01u8];
        two.extend([0xC5u8; 255]);
        assert_eq!(rsa_modulus_bits(&URL_SAFE_NO_PAD.encode(&two)), 2041);
        assert_eq!(rsa_modulus_bits(""), 0);
    }

    fn okp(alg: Option<&str>) -> Jwk {
        Jwk {
            kty: "OKP".to_string(),
            kid: Some("ed-1".to_string()),
            key_use: Some("sig".to_string()),
            alg: alg.map(str::to_string),
            n: None,
            e: None,
            x: Some(URL_SAFE_NO_PAD.encode([7u8; 32])),
            y: None,
            crv: Some("Ed25519".to_string()),
        }
    }

    #[test]
    fn test_declared_hmac_algorithm_on_asymmetric_key_is_ignored() {
        let ed = okp(Some("HS256"));
        assert!(!ed.has_consistent_algorithm());
        assert!(!ed.supports_algorithm("HS256"));
        assert!(!ed.supports_algorithm("EdDSA"));

        let rsa = Jwk::rsa("key-1", strong_modulus(), "AQAB").with_algorithm("HS256");
        assert!(!rsa.has_consistent_algorithm());
        assert!(!rsa.supports_algorithm("HS256"));
        assert!(!rsa.supports_algorithm("RS256"));
    }

    #[test]
    fn test_declared_algorithm_within_family() {
        assert!(okp(Some("EdDSA")).has_consistent_algorithm());
        assert!(okp(Some("EdDSA")).supports_algorithm("EdDSA"));
        assert!(okp(None).has_consistent_algorithm());
        assert!(!Jwk::rsa("key-1", strong_modulus(), "AQAB").with_algorithm("ES256").has_consistent_algorithm());
    }

    #[test]
    fn test_unsupported_key_type() {
        let mut jwk = Jwk::rsa("k", strong_modulus(), "AQAB");
        jwk.kty = "DSA".to_string();
        assert!(jwk.decoding_key().is_none());
        assert!(!jwk.supports_algorithm("RS256"));
    }

    #[test]
    fn test_deserialize_ignores_unknown_members() {
        let json = r#"{"keys":[{"kty":"RSA","kid":"k","use":"sig","n":"AQ","e":"AQAB","x5t":"abc"}]}"#;
        let jwks: Jwks = serde_json::from_str(json).unwrap();
        assert_eq!(jwks.keys[0].key_use.as_deref(), Some("sig"));
    }
}
