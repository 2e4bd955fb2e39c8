//! Token parsing and claims.

pub mod claims;
pub mod compact;
pub mod token;

pub use claims::ClaimsSet;
pub use token::{EncryptedToken, JweHeader, JwsHeader, SignedToken, Token, UnsecuredToken, ValidatedToken};
