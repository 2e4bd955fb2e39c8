//! Remote key set retrieval.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::error::KeySetError;
use crate::jwks::model::Jwks;

/// Default request timeout for key set fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves a JSON Web Key Set document.
///
/// Implementations own transport concerns, including timeouts.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetches the key set published at `url`.
    async fn fetch(&self, url: &Url) -> Result<Jwks, KeySetError>;
}

/// Fetches key sets over HTTP(S) with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Client {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self, url: &Url) -> Result<Jwks, KeySetError> {
        info!(url = %url, "Fetching JWKS");

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "JWKS endpoint returned error status");
            return Err(KeySetError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<Jwks>(&body).map_err(|e| KeySetError::decode(e.to_string()))
    }
}
