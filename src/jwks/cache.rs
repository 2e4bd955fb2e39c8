//! Remote key set trust with a single-flight refreshing cache.
//!
//! Introspection (`is_expired`, `is_present`, `key_ids`) only reads the
//! current entry and never fetches. `keys`, `supports` and `verify` fetch when
//! nothing is cached. Refreshes are deduplicated: concurrent callers share one
//! in-flight fetch.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{KeySetError, VerifyError};
use crate::jwks::fetcher::KeySetFetcher;
use crate::jwks::model::{Jwk, Jwks};
use crate::jwt::SignedToken;

/// Default time a fetched key set is considered fresh
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Usable key with its decoded verification material.
struct CachedKey {
    jwk: Jwk,
    key: DecodingKey,
}

/// One fetched key set. Keys and fetch instant are replaced together.
struct CachedKeySet {
    keys: Vec<CachedKey>,
    key_ids: HashSet<String>,
    fetched_at: Instant,
}

impl CachedKeySet {
    fn new(jwks: &Jwks, key_type: Option<&str>) -> Self {
        let keys: Vec<CachedKey> = jwks
            .keys
            .iter()
            .filter(|jwk| key_type.is_none_or(|kty| jwk.kty == kty))
            .filter(|jwk| jwk.is_signing_key())
            .filter(|jwk| {
                let consistent = jwk.has_consistent_algorithm();
                if !consistent {
                    warn!(kid = ?jwk.kid, kty = %jwk.kty, alg = ?jwk.alg, "declared algorithm does not fit key type, skipping key");
                }
                consistent
            })
            .filter_map(|jwk| {
                jwk.decoding_key().map(|key| CachedKey {
                    jwk: jwk.clone(),
                    key,
                })
            })
            .collect();
        let key_ids = keys.iter().filter_map(|k| k.jwk.kid.clone()).collect();

        Self {
            keys,
            key_ids,
            fetched_at: Instant::now(),
        }
    }

    fn supports(&self, algorithm: &str) -> bool {
        self.keys.iter().any(|k| k.jwk.supports_algorithm(algorithm))
    }

    /// Keys matching the token key id (all keys when the token has none)
    /// that can verify the algorithm.
    fn candidates<'a>(&'a self, kid: Option<&'a str>, algorithm: &'a str) -> impl Iterator<Item = &'a CachedKey> + 'a {
        self.keys.iter().filter(move |k| {
            kid.is_none_or(|kid| k.jwk.kid.as_deref() == Some(kid)) && k.jwk.supports_algorithm(algorithm)
        })
    }
}

type InflightFetch = Shared<BoxFuture<'static, Result<Arc<CachedKeySet>, KeySetError>>>;

/// Signature trust backed by a remote JSON Web Key Set.
pub struct JwksSignature {
    url: Url,
    ttl: Duration,
    key_type: Option<String>,
    fetcher: Arc<dyn KeySetFetcher>,
    state: Arc<ArcSwapOption<CachedKeySet>>,
    inflight: Arc<Mutex<Option<InflightFetch>>>,
    fetches: Arc<AtomicU64>,
    evictions: AtomicU64,
}

impl JwksSignature {
    /// Creates a trust for the key set at `url` with the default TTL.
    #[must_use]
    pub fn new(url: Url, fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self {
            url,
            ttl: DEFAULT_CACHE_TTL,
            key_type: None,
            fetcher,
            state: Arc::new(ArcSwapOption::empty()),
            inflight: Arc::new(Mutex::new(None)),
            fetches: Arc::new(AtomicU64::new(0)),
            evictions: AtomicU64::new(0),
        }
    }

    /// Sets how long fetched keys stay fresh
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Only keep keys of this `kty`
    #[must_use]
    pub fn with_key_type(mut self, key_type: impl Into<String>) -> Self {
        self.key_type = Some(key_type.into());
        self
    }

    /// Key set location
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Freshness window
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True when nothing is cached or the cached set is at least `ttl` old.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state
            .load()
            .as_ref()
            .is_none_or(|entry| entry.fetched_at.elapsed() >= self.ttl)
    }

    /// True when key material is cached, fresh or not.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.state.load().is_some()
    }

    /// Cached key ids; `None` when nothing is cached. Never fetches.
    #[must_use]
    pub fn key_ids(&self) -> Option<HashSet<String>> {
        self.state.load().as_ref().map(|entry| entry.key_ids.clone())
    }

    /// Checks the cached key ids for `kid` without fetching.
    #[must_use]
    pub fn contains_key_id(&self, kid: &str) -> bool {
        self.state
            .load()
            .as_ref()
            .is_some_and(|entry| entry.key_ids.contains(kid))
    }

    /// Algorithm support according to cached keys; `None` when nothing is cached.
    #[must_use]
    pub fn supports_cached(&self, algorithm: &str) -> Option<bool> {
        self.state.load().as_ref().map(|entry| entry.supports(algorithm))
    }

    /// Evicts cached key material. Idempotent; returns whether anything
    /// was dropped.
    pub fn clear(&self) -> bool {
        let evicted = self.state.swap(None).is_some();
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(url = %self.url, "JWKS cache evicted");
        }
        evicted
    }

    /// Number of fetches started
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of evictions that dropped cached material
    #[must_use]
    pub fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Checks whether any key in the set can verify `algorithm`, fetching
    /// the set if it is not cached.
    pub async fn supports(&self, algorithm: &str) -> bool {
        match self.cached_or_fetch().await {
            Ok(entry) => entry.supports(algorithm),
            Err(e) => {
                warn!(url = %self.url, error = %e, "JWKS unavailable");
                false
            }
        }
    }

    /// Number of usable keys, fetching the set if it is not cached.
    ///
    /// # Errors
    ///
    /// Returns a [`KeySetError`] if the set had to be fetched and the fetch failed.
    pub async fn key_count(&self) -> Result<usize, KeySetError> {
        self.cached_or_fetch().await.map(|entry| entry.keys.len())
    }

    /// Verifies the token signature against the matching keys of the set.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::KeySet`] when the set could not be fetched and
    /// [`VerifyError::UnsupportedAlgorithm`] for algorithms outside the JWS
    /// registry.
    #[instrument(skip(self, token), fields(url = %self.url, kid = ?token.key_id()))]
    pub async fn verify(&self, token: &SignedToken) -> Result<bool, VerifyError> {
        let entry = self.cached_or_fetch().await?;
        let algorithm =
            Algorithm::from_str(token.algorithm()).map_err(|_| VerifyError::unsupported(token.algorithm()))?;

        for candidate in entry.candidates(token.key_id(), token.algorithm()) {
            match jsonwebtoken::crypto::verify(
                token.signature(),
                token.signing_input().as_bytes(),
                &candidate.key,
                algorithm,
            ) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => debug!(kid = ?candidate.jwk.kid, error = %e, "key could not verify token"),
            }
        }

        debug!("no key in set verified token");
        Ok(false)
    }

    async fn cached_or_fetch(&self) -> Result<Arc<CachedKeySet>, KeySetError> {
        if let Some(entry) = self.state.load_full() {
            return Ok(entry);
        }
        self.refresh_single_flight().await
    }

    /// Fetches the set; concurrent callers join one in-flight fetch.
    async fn refresh_single_flight(&self) -> Result<Arc<CachedKeySet>, KeySetError> {
        let mut inflight_guard = self.inflight.lock().await;

        // A completed future left behind by a cancelled caller is not reused.
        let pending = inflight_guard.as_ref().filter(|fut| fut.peek().is_none()).cloned();
        let shared = match pending {
            Some(fut) => fut,
            None => {
                let fut = self.fetch_future().shared();
                *inflight_guard = Some(fut.clone());
                fut
            }
        };
        drop(inflight_guard);

        let result = shared.clone().await;

        let mut inflight_guard = self.inflight.lock().await;
        if inflight_guard.as_ref().is_some_and(|fut| fut.ptr_eq(&shared)) {
            inflight_guard.take();
        }

        result
    }

    fn fetch_future(&self) -> BoxFuture<'static, Result<Arc<CachedKeySet>, KeySetError>> {
        let url = self.url.clone();
        let key_type = self.key_type.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        let fetches = Arc::clone(&self.fetches);

        Box::pin(async move {
            fetches.fetch_add(1, Ordering::Relaxed);
            let jwks = fetcher.fetch(&url).await?;

            let entry = Arc::new(CachedKeySet::new(&jwks, key_type.as_deref()));
            if entry.keys.len() < jwks.keys.len() {
                debug!(
                    url = %url,
                    skipped = jwks.keys.len() - entry.keys.len(),
                    "ignored unusable keys"
                );
            }
            state.store(Some(Arc::clone(&entry)));

            info!(url = %url, "JWKS cache updated with {} keys", entry.keys.len());
            Ok(entry)
        })
    }
}

impl std::fmt::Debug for JwksSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksSignature")
            .field("url", &self.url.as_str())
            .field("ttl", &self.ttl)
            .field("key_type", &self.key_type)
            .field("present", &self.is_present())
            .finish_non_exhaustive()
    }
}
