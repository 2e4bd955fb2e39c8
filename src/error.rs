//! Error types for token parsing, trust evaluation and validation
//!
//! Every failure inside the validator is typed here, but none of them reach
//! the caller of [`JwtValidator::validate`](crate::validator::JwtValidator::validate):
//! rejections collapse to `None` and the detail goes to tracing and metrics.

use thiserror::Error;

/// Sensitive patterns that should be sanitized from error messages
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key=",
    "credential",
    "bearer",
    "authorization",
    "private",
];

/// Replacement text for redacted messages
const REDACTED: &str = "details redacted";

/// Structural failure while decoding a compact-serialized token.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input is larger than the accepted maximum
    #[error("token too large: {length} bytes")]
    TooLarge {
        /// Length of the rejected input
        length: usize,
    },

    /// Wrong number of dot-separated segments
    #[error("unexpected segment count: {found}")]
    SegmentCount {
        /// Number of segments found
        found: usize,
    },

    /// A segment is not valid unpadded base64url
    #[error("segment {index} is not valid base64url")]
    Encoding {
        /// Zero-based segment index
        index: usize,
    },

    /// The protected header is not a valid JOSE header
    #[error("invalid header: {reason}")]
    Header {
        /// Description of the problem
        reason: String,
    },

    /// Header and segment layout do not describe any known token kind
    #[error("unrecognised token shape: {reason}")]
    Shape {
        /// Description of the problem
        reason: String,
    },
}

impl ParseError {
    /// Creates a Header error
    #[must_use]
    pub fn header(reason: impl Into<String>) -> Self {
        Self::Header {
            reason: sanitize_message(&reason.into()),
        }
    }

    /// Creates a Shape error
    #[must_use]
    pub fn shape(reason: impl Into<String>) -> Self {
        Self::Shape {
            reason: reason.into(),
        }
    }
}

/// Failure while decoding the claims set of a structurally accepted token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// Payload is valid JSON but not an object
    #[error("claims payload is not a JSON object")]
    NotAnObject,

    /// Payload is not valid JSON
    #[error("claims payload is not valid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ClaimsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(sanitize_message(&err.to_string()))
    }
}

/// Failure while fetching or decoding a remote JSON Web Key Set.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeySetError {
    /// HTTP client could not be built
    #[error("key set client error: {reason}")]
    Client {
        /// Description of the problem
        reason: String,
    },

    /// Request did not complete
    #[error("key set fetch failed: {reason}")]
    Fetch {
        /// Description of the problem
        reason: String,
    },

    /// Endpoint answered with a non-success status
    #[error("key set fetch failed with status: {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Body is not a JSON Web Key Set
    #[error("failed to parse key set: {reason}")]
    Decode {
        /// Description of the problem
        reason: String,
    },
}

impl KeySetError {
    /// Creates a Fetch error
    #[must_use]
    pub fn fetch(reason: impl Into<String>) -> Self {
        Self::Fetch {
            reason: sanitize_message(&reason.into()),
        }
    }

    /// Creates a Decode error
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: sanitize_message(&reason.into()),
        }
    }

    /// Checks if a later attempt may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { .. } => true,
            Self::Status { status } => *status >= 500 || *status == 429,
            Self::Client { .. } | Self::Decode { .. } => false,
        }
    }
}

impl From<reqwest::Error> for KeySetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::fetch(err.to_string())
        }
    }
}

/// A signature configuration could not evaluate a token.
///
/// The orchestrator treats every variant exactly like a `false` verification
/// result: the candidate simply does not accept the token.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Configuration cannot handle the token algorithm
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// Algorithm from the token header
        algorithm: String,
    },

    /// Key material is unusable
    #[error("invalid verification key: {reason}")]
    InvalidKey {
        /// Description of the problem
        reason: String,
    },

    /// Underlying signature primitive failed
    #[error("signature verification error: {reason}")]
    Crypto {
        /// Description of the problem
        reason: String,
    },

    /// Remote key material could not be obtained
    #[error(transparent)]
    KeySet(#[from] KeySetError),
}

impl VerifyError {
    /// Creates an UnsupportedAlgorithm error
    #[must_use]
    pub fn unsupported(algorithm: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Creates an InvalidKey error
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: sanitize_message(&reason.into()),
        }
    }

    /// Creates a Crypto error
    #[must_use]
    pub fn crypto(reason: impl Into<String>) -> Self {
        Self::Crypto {
            reason: sanitize_message(&reason.into()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidAlgorithmName | ErrorKind::InvalidAlgorithm => {
                Self::crypto("algorithm not usable with this key")
            }
            ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey => Self::invalid_key(err.to_string()),
            _ => Self::crypto(err.to_string()),
        }
    }
}

/// An encryption configuration could not decrypt a token.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// Configuration does not handle this algorithm/method pair
    #[error("unsupported encryption: alg={algorithm} enc={method}")]
    Unsupported {
        /// Key management algorithm
        algorithm: String,
        /// Content encryption method
        method: String,
    },

    /// Token segments are inconsistent with the declared algorithm
    #[error("invalid encrypted token: {reason}")]
    InvalidInput {
        /// Description of the problem
        reason: String,
    },

    /// Authenticated decryption failed
    #[error("decryption failed")]
    Failed,

    /// Decryption succeeded but the payload is not a compact signed token
    #[error("decrypted payload is not a signed token")]
    PayloadNotSigned,
}

impl DecryptError {
    /// Creates an InvalidInput error
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Why a token was rejected.
///
/// Internal taxonomy: distinguishable for diagnostics, collapsed to `None`
/// for callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Input could not be parsed into a token
    #[error("token malformed")]
    MalformedToken,

    /// No configured signature or encryption candidate accepted the token
    #[error("no matching trust configuration")]
    NoMatchingTrust,

    /// Cryptographically valid token whose claims failed policy
    #[error("claims rejected")]
    ClaimRejected,
}

impl ValidationError {
    /// Stable label used for metrics and structured logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed",
            Self::NoMatchingTrust => "no_matching_trust",
            Self::ClaimRejected => "claim_rejected",
        }
    }
}

/// Sanitize a message by removing sensitive information
pub(crate) fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) || looks_like_key_material(message) {
        return REDACTED.to_string();
    }
    message.to_string()
}

/// Check if a string contains sensitive information
#[must_use]
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Checks for long base64url/hex runs that may be token or key material
fn looks_like_key_material(s: &str) -> bool {
    s.split(|c: char| c.is_whitespace() || c == '.' || c == ',' || c == '"')
        .any(|run| {
            run.len() >= 40
                && run
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
        })
}
