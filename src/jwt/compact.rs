//! Compact serialization decoder.
//!
//! Splits a dot-separated token, base64url-decodes its segments and the
//! protected header, and classifies the result by header shape. Signatures
//! and ciphertexts are only decoded here, never checked.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::jwt::token::{EncryptedToken, JweHeader, JwsHeader, SignedToken, Token, UnsecuredToken};

/// Upper bound on accepted input, checked before any decoding.
pub const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// `alg` value of an unsecured JWS.
pub const ALG_NONE: &str = "none";

const SEPARATOR: u8 = b'.';

/// Cheap pre-check: a JWS needs two separators, a JWE four.
#[must_use]
pub fn has_minimum_separators(raw: &str) -> bool {
    raw.bytes().filter(|b| *b == SEPARATOR).nth(1).is_some()
}

/// Decodes one unpadded base64url segment.
pub(crate) fn decode_segment(segment: &str, index: usize) -> Result<Vec<u8>, ParseError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| ParseError::Encoding { index })
}

/// Encodes bytes as one unpadded base64url segment.
#[must_use]
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Parses a compact-serialized token into exactly one of the unsecured,
/// signed or encrypted variants.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first structural problem found.
pub fn decode(raw: &str) -> Result<Token, ParseError> {
    if raw.len() > MAX_TOKEN_LENGTH {
        return Err(ParseError::TooLarge { length: raw.len() });
    }

    let segments: Vec<&str> = raw.split(char::from(SEPARATOR)).collect();
    if segments.len() != 3 && segments.len() != 5 {
        return Err(ParseError::SegmentCount {
            found: segments.len(),
        });
    }

    let header = decode_header(segments[0])?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::header("missing or non-string alg"))?;
    let unsecured = alg == ALG_NONE;
    let has_enc = header.contains_key("enc");

    match (segments.len(), has_enc) {
        (3, false) if unsecured => decode_unsecured(raw, &segments, header).map(Token::Unsecured),
        (3, false) => decode_signed(raw, &segments, header).map(Token::Signed),
        (5, true) => decode_encrypted(raw, &segments, header).map(Token::Encrypted),
        (3, true) => Err(ParseError::shape("enc header on a three-segment token")),
        _ => Err(ParseError::shape("five-segment token without enc header")),
    }
}

fn decode_header(segment: &str) -> Result<Map<String, Value>, ParseError> {
    let bytes = decode_segment(segment, 0)?;
    serde_json::from_slice(&bytes).map_err(|e| ParseError::header(e.to_string()))
}

fn decode_unsecured(
    raw: &str,
    segments: &[&str],
    header: Map<String, Value>,
) -> Result<UnsecuredToken, ParseError> {
    if !segments[2].is_empty() {
        return Err(ParseError::shape("unsecured token carries a signature"));
    }
    let header: JwsHeader = typed_header(header)?;
    let payload = decode_segment(segments[1], 1)?;
    Ok(UnsecuredToken::new(raw.to_string(), header, payload))
}

fn decode_signed(
    raw: &str,
    segments: &[&str],
    header: Map<String, Value>,
) -> Result<SignedToken, ParseError> {
    if segments[2].is_empty() {
        return Err(ParseError::shape("signed token without signature"));
    }
    let header: JwsHeader = typed_header(header)?;
    let payload = decode_segment(segments[1], 1)?;
    decode_segment(segments[2], 2)?;

    // header.payload is the signing input; the signature follows the last dot
    let signature_offset = segments[0].len() + segments[1].len() + 2;
    Ok(SignedToken::new(raw.to_string(), header, payload, signature_offset))
}

fn decode_encrypted(
    raw: &str,
    segments: &[&str],
    header: Map<String, Value>,
) -> Result<EncryptedToken, ParseError> {
    let header: JweHeader = typed_header(header)?;
    let encrypted_key = decode_segment(segments[1], 1)?;
    let iv = decode_segment(segments[2], 2)?;
    let ciphertext = decode_segment(segments[3], 3)?;
    let tag = decode_segment(segments[4], 4)?;
    if ciphertext.is_empty() || tag.is_empty() {
        return Err(ParseError::shape("encrypted token without ciphertext or tag"));
    }

    Ok(EncryptedToken::new(
        raw.to_string(),
        header,
        segments[0].len(),
        encrypted_key,
        iv,
        ciphertext,
        tag,
    ))
}

fn typed_header<T: serde::de::DeserializeOwned>(header: Map<String, Value>) -> Result<T, ParseError> {
    serde_json::from_value(Value::Object(header)).map_err(|e| ParseError::header(e.to_string()))
}
