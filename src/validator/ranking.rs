//! Candidate ordering.
//!
//! Ranking only looks at what is already cached. A key set with nothing
//! cached never matches the key id and never counts as supporting the
//! algorithm, even if a fetch would show that it does.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::encryption::EncryptionConfiguration;
use crate::signature::SignatureConfiguration;

/// (key id match, algorithm support); higher ranks first.
fn signature_rank(config: &SignatureConfiguration, algorithm: &str, kid: Option<&str>) -> (bool, bool) {
    match config {
        SignatureConfiguration::Key(verifier) => (false, verifier.supports(algorithm)),
        SignatureConfiguration::KeySet(jwks) => {
            let kid_match = kid.is_some_and(|kid| jwks.contains_key_id(kid));
            // unwrap_or(false) covers the not-present case without fetching
            let supported = jwks.supports_cached(algorithm).unwrap_or(false);
            (kid_match, supported)
        }
    }
}

/// Orders signature configurations by key id match, then algorithm support.
///
/// The sort is stable: equal candidates keep registration order.
#[must_use]
pub fn rank_signatures<'a>(
    configs: &'a [SignatureConfiguration],
    algorithm: &str,
    kid: Option<&str>,
) -> Vec<&'a SignatureConfiguration> {
    let mut ranked: Vec<_> = configs
        .iter()
        .map(|config| (signature_rank(config, algorithm, kid), config))
        .collect();
    ranked.sort_by_key(|(rank, _)| Reverse(*rank));
    ranked.into_iter().map(|(_, config)| config).collect()
}

/// Orders encryption configurations, supporting ones first.
///
/// The sort is stable: equal candidates keep registration order.
#[must_use]
pub fn rank_encryptions<'a>(
    configs: &'a [Arc<dyn EncryptionConfiguration>],
    algorithm: &str,
    method: &str,
) -> Vec<&'a Arc<dyn EncryptionConfiguration>> {
    let mut ranked: Vec<_> = configs
        .iter()
        .map(|config| (config.supports(algorithm, method), config))
        .collect();
    ranked.sort_by_key(|(supported, _)| Reverse(*supported));
    ranked.into_iter().map(|(_, config)| config).collect()
}
