//! Typed token variants produced by the parser.
//!
//! A raw string becomes exactly one [`Token`] variant. Parse failures are
//! captured as [`Token::Malformed`] instead of being propagated, so callers
//! only ever branch on the variant.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ClaimsError;
use crate::jwt::claims::ClaimsSet;
use crate::jwt::compact;

/// Protected header of a signed or unsecured token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signature algorithm (`none` for unsecured tokens)
    pub alg: String,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Media type of the complete token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Media type of the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

/// Protected header of an encrypted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    /// Key management algorithm
    pub alg: String,
    /// Content encryption method
    pub enc: String,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Media type of the complete token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Media type of the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    /// Compression algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// Parsed token, classified by header shape.
#[derive(Debug, Clone)]
pub enum Token {
    /// `alg: none`, no signature
    Unsecured(UnsecuredToken),
    /// JWS compact serialization
    Signed(SignedToken),
    /// JWE compact serialization
    Encrypted(EncryptedToken),
    /// Anything that could not be parsed
    Malformed,
}

impl Token {
    /// Parses a raw compact-serialized string.
    ///
    /// Input with fewer than two `.` separators is rejected without invoking
    /// the decoder.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if !compact::has_minimum_separators(raw) {
            trace!("token does not contain two separators");
            return Self::Malformed;
        }

        match compact::decode(raw) {
            Ok(token) => token,
            Err(e) => {
                trace!(error = %e, "failed to parse token");
                Self::Malformed
            }
        }
    }

    /// Short variant name for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unsecured(_) => "unsecured",
            Self::Signed(_) => "signed",
            Self::Encrypted(_) => "encrypted",
            Self::Malformed => "malformed",
        }
    }

    /// Checks whether parsing failed
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed)
    }

    /// Original compact serialization, if the token parsed.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Unsecured(t) => Some(t.as_str()),
            Self::Signed(t) => Some(t.as_str()),
            Self::Encrypted(t) => Some(t.as_str()),
            Self::Malformed => None,
        }
    }
}

/// Unsecured (`alg: none`) token.
#[derive(Clone)]
pub struct UnsecuredToken {
    raw: String,
    header: JwsHeader,
    payload: Vec<u8>,
}

impl UnsecuredToken {
    pub(crate) fn new(raw: String, header: JwsHeader, payload: Vec<u8>) -> Self {
        Self { raw, header, payload }
    }

    /// Protected header
    #[must_use]
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// Decoded payload bytes
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Decodes the payload as a claims set.
    ///
    /// # Errors
    ///
    /// Returns a [`ClaimsError`] if the payload is not a JSON object.
    pub fn claims(&self) -> Result<ClaimsSet, ClaimsError> {
        ClaimsSet::from_slice(&self.payload)
    }

    /// Original compact serialization
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Signed (JWS) token.
#[derive(Clone)]
pub struct SignedToken {
    raw: String,
    header: JwsHeader,
    payload: Vec<u8>,
    signature_offset: usize,
}

impl SignedToken {
    pub(crate) fn new(raw: String, header: JwsHeader, payload: Vec<u8>, signature_offset: usize) -> Self {
        Self {
            raw,
            header,
            payload,
            signature_offset,
        }
    }

    /// Protected header
    #[must_use]
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// Signature algorithm from the header
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.header.alg
    }

    /// Key ID from the header
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    /// `header.payload` exactly as received; the bytes the signature covers.
    #[must_use]
    pub fn signing_input(&self) -> &str {
        &self.raw[..self.signature_offset - 1]
    }

    /// Base64url-encoded signature segment
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.raw[self.signature_offset..]
    }

    /// Decoded payload bytes
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Decodes the payload as a claims set.
    ///
    /// # Errors
    ///
    /// Returns a [`ClaimsError`] if the payload is not a JSON object.
    pub fn claims(&self) -> Result<ClaimsSet, ClaimsError> {
        ClaimsSet::from_slice(&self.payload)
    }

    /// Original compact serialization
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Encrypted (JWE) token.
#[derive(Clone)]
pub struct EncryptedToken {
    raw: String,
    header: JweHeader,
    protected_len: usize,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl EncryptedToken {
    pub(crate) fn new(
        raw: String,
        header: JweHeader,
        protected_len: usize,
        encrypted_key: Vec<u8>,
        iv: Vec<u8>,
        ciphertext: Vec<u8>,
        tag: Vec<u8>,
    ) -> Self {
        Self {
            raw,
            header,
            protected_len,
            encrypted_key,
            iv,
            ciphertext,
            tag,
        }
    }

    /// Protected header
    #[must_use]
    pub fn header(&self) -> &JweHeader {
        &self.header
    }

    /// Key management algorithm
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.header.alg
    }

    /// Content encryption method
    #[must_use]
    pub fn method(&self) -> &str {
        &self.header.enc
    }

    /// Key ID from the header
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    /// Encoded protected header segment, used as additional authenticated data.
    #[must_use]
    pub fn protected_header(&self) -> &str {
        &self.raw[..self.protected_len]
    }

    /// Encrypted content encryption key (empty for direct encryption)
    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// Initialization vector
    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Ciphertext
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Authentication tag
    #[must_use]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Original compact serialization
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// Token material stays out of Debug output; only headers are shown.
impl fmt::Debug for UnsecuredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsecuredToken").field("header", &self.header).finish_non_exhaustive()
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedToken").field("header", &self.header).finish_non_exhaustive()
    }
}

impl fmt::Debug for EncryptedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedToken").field("header", &self.header).finish_non_exhaustive()
    }
}

/// A token that passed structural, cryptographic and claims validation.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    token: Token,
    nested: Option<SignedToken>,
    claims: ClaimsSet,
}

impl ValidatedToken {
    pub(crate) fn new(token: Token, nested: Option<SignedToken>, claims: ClaimsSet) -> Self {
        Self { token, nested, claims }
    }

    /// The token as received
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The signed token whose signature was verified: the token itself, or
    /// the decrypted payload of an encrypted token. `None` for unsecured tokens.
    #[must_use]
    pub fn signed_token(&self) -> Option<&SignedToken> {
        match &self.token {
            Token::Signed(signed) => Some(signed),
            _ => self.nested.as_ref(),
        }
    }

    /// Decoded claims
    #[must_use]
    pub fn claims(&self) -> &ClaimsSet {
        &self.claims
    }

    /// Consumes the token, returning its claims
    #[must_use]
    pub fn into_claims(self) -> ClaimsSet {
        self.claims
    }

    /// Subject claim
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.subject()
    }

    /// Issuer claim
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.claims.issuer()
    }
}
