//! Direct symmetric encryption (`alg: dir`) with AES-GCM.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use async_trait::async_trait;
use tracing::debug;

use crate::encryption::EncryptionConfiguration;
use crate::error::DecryptError;
use crate::jwt::{EncryptedToken, SignedToken, Token};

/// Key management algorithm handled here
pub const ALG_DIR: &str = "dir";

const GCM_NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;

/// Content encryption methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncryption {
    /// AES-128-GCM
    A128Gcm,
    /// AES-256-GCM
    A256Gcm,
}

impl ContentEncryption {
    /// JOSE `enc` identifier
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    const fn key_len(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A256Gcm => 32,
        }
    }
}

/// Decrypts JWEs encrypted directly with a shared content key.
#[derive(Clone)]
pub struct DirectEncryption {
    key: Vec<u8>,
    method: ContentEncryption,
}

impl DirectEncryption {
    /// Creates a configuration; the method follows from the key length
    /// (16 bytes: A128GCM, 32 bytes: A256GCM).
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError::InvalidInput`] for any other key length.
    pub fn new(key: &[u8]) -> Result<Self, DecryptError> {
        let method = match key.len() {
            16 => ContentEncryption::A128Gcm,
            32 => ContentEncryption::A256Gcm,
            n => return Err(DecryptError::invalid_input(format!("unsupported key length {n}"))),
        };
        Ok(Self {
            key: key.to_vec(),
            method,
        })
    }

    /// Content encryption method of this key
    #[must_use]
    pub fn method(&self) -> ContentEncryption {
        self.method
    }

    fn open(&self, token: &EncryptedToken) -> Result<Vec<u8>, DecryptError> {
        if !token.encrypted_key().is_empty() {
            return Err(DecryptError::invalid_input("direct encryption with an encrypted key"));
        }
        if token.iv().len() != GCM_NONCE_LEN {
            return Err(DecryptError::invalid_input("initialization vector must be 96 bits"));
        }
        if token.tag().len() != GCM_TAG_LEN {
            return Err(DecryptError::invalid_input("authentication tag must be 128 bits"));
        }
        if token.header().zip.is_some() {
            return Err(DecryptError::invalid_input("compressed payloads are not supported"));
        }
        debug_assert_eq!(self.key.len(), self.method.key_len());

        let mut sealed = Vec::with_capacity(token.ciphertext().len() + GCM_TAG_LEN);
        sealed.extend_from_slice(token.ciphertext());
        sealed.extend_from_slice(token.tag());

        let payload = Payload {
            msg: &sealed,
            aad: token.protected_header().as_bytes(),
        };
        let nonce = Nonce::from_slice(token.iv());

        let opened = match self.method {
            ContentEncryption::A128Gcm => Aes128Gcm::new_from_slice(&self.key)
                .map_err(|_| DecryptError::invalid_input("content key length"))?
                .decrypt(nonce, payload),
            ContentEncryption::A256Gcm => Aes256Gcm::new_from_slice(&self.key)
                .map_err(|_| DecryptError::invalid_input("content key length"))?
                .decrypt(nonce, payload),
        };
        opened.map_err(|_| DecryptError::Failed)
    }
}

#[async_trait]
impl EncryptionConfiguration for DirectEncryption {
    fn supports(&self, algorithm: &str, method: &str) -> bool {
        algorithm == ALG_DIR && method == self.method.name()
    }

    async fn decrypt(&self, token: &EncryptedToken) -> Result<SignedToken, DecryptError> {
        if !self.supports(token.algorithm(), token.method()) {
            return Err(DecryptError::Unsupported {
                algorithm: token.algorithm().to_string(),
                method: token.method().to_string(),
            });
        }

        let plaintext = self.open(token)?;
        let inner = std::str::from_utf8(&plaintext).map_err(|_| DecryptError::PayloadNotSigned)?;

        match Token::parse(inner) {
            Token::Signed(signed) => Ok(signed),
            other => {
                debug!(kind = other.kind(), "decrypted payload is not a signed token");
                Err(DecryptError::PayloadNotSigned)
            }
        }
    }
}

impl std::fmt::Debug for DirectEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectEncryption")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
