//! JSON Web Key Sets: model, remote fetching, caching trust and publication.

pub mod cache;
pub mod fetcher;
pub mod model;
pub mod publisher;

pub use cache::{DEFAULT_CACHE_TTL, JwksSignature};
pub use fetcher::{DEFAULT_FETCH_TIMEOUT, HttpKeySetFetcher, KeySetFetcher};
pub use model::{Jwk, Jwks};
pub use publisher::{EMPTY_KEYS, JwkProvider, KeysPublisher, RotatingKeys};
