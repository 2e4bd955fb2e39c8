//! Encryption trust configurations.

pub mod direct;

use async_trait::async_trait;

use crate::error::DecryptError;
use crate::jwt::{EncryptedToken, SignedToken};

pub use direct::{ContentEncryption, DirectEncryption};

/// Decrypts encrypted tokens whose payload is a signed token.
#[async_trait]
pub trait EncryptionConfiguration: Send + Sync {
    /// Checks whether the configuration handles the `alg`/`enc` pair
    fn supports(&self, algorithm: &str, method: &str) -> bool;

    /// Decrypts the token and returns the nested signed token.
    ///
    /// [`DecryptError::PayloadNotSigned`] means decryption worked but the
    /// plaintext is not a signed token.
    async fn decrypt(&self, token: &EncryptedToken) -> Result<SignedToken, DecryptError>;
}
