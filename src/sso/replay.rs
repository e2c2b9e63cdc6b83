//! Single-use enforcement: burn a token's jti the moment its signature
//! checks out.
//!
//! Burning happens before any claim validation so a signed token that fails
//! later checks is still consumed, which stops an attacker from probing the
//! pipeline repeatedly with the same captured token.

use crate::sso::claims::CLOCK_SKEW_SECONDS;
use crate::sso::store::TtlStore;
use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Nonce lifetime when the token carries no `exp` claim.
const DEFAULT_NONCE_TTL_SECONDS: u64 = 600;

pub struct ReplayGuard {
    store: Arc<dyn TtlStore>,
}

impl ReplayGuard {
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self { store }
    }

    /// Record `jti` for this site and report whether it was fresh.
    /// `false` means the token was seen before and must be rejected.
    ///
    /// The record lives slightly past the token's own expiry and is never
    /// deleted early; it simply ages out of the store.
    pub async fn check_and_burn(&self, site_id: &str, jti: &str, exp: Option<i64>, now: i64) -> bool {
        let ttl_seconds = match exp {
            Some(exp) => (exp - now + CLOCK_SKEW_SECONDS).max(1) as u64,
            None => DEFAULT_NONCE_TTL_SECONDS,
        };

        self.store
            .add_if_absent(&nonce_key(site_id, jti), Duration::from_secs(ttl_seconds))
            .await
    }
}

/// Store key for a burned jti. Hashed so arbitrary token ids cannot grow
/// unbounded keys or collide with other record types.
fn nonce_key(site_id: &str, jti: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(site_id.as_bytes());
    hasher.update(b":");
    hasher.update(jti.as_bytes());
    format!("nonce:{}", Base64UrlUnpadded::encode_string(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sso::store::InMemoryTtlStore;

    const NOW: i64 = 1_700_000_000;

    fn guard() -> ReplayGuard {
        ReplayGuard::new(Arc::new(InMemoryTtlStore::new()))
    }

    #[tokio::test]
    async fn first_use_accepted_second_rejected() {
        let guard = guard();
        assert!(guard.check_and_burn("site-1", "jti-1", Some(NOW + 300), NOW).await);
        assert!(!guard.check_and_burn("site-1", "jti-1", Some(NOW + 300), NOW).await);
    }

    #[tokio::test]
    async fn sites_do_not_share_nonces() {
        let guard = guard();
        assert!(guard.check_and_burn("site-1", "jti-1", Some(NOW + 300), NOW).await);
        assert!(guard.check_and_burn("site-2", "jti-1", Some(NOW + 300), NOW).await);
    }

    #[tokio::test]
    async fn missing_exp_uses_default_ttl() {
        let guard = guard();
        assert!(guard.check_and_burn("site-1", "jti-1", None, NOW).await);
        assert!(!guard.check_and_burn("site-1", "jti-1", None, NOW).await);
    }

    #[tokio::test]
    async fn already_expired_token_still_burns() {
        // TTL floors at one second even when exp is in the past
        let guard = guard();
        assert!(guard.check_and_burn("site-1", "jti-1", Some(NOW - 900), NOW).await);
        assert!(!guard.check_and_burn("site-1", "jti-1", Some(NOW - 900), NOW).await);
    }

    #[test]
    fn nonce_keys_are_namespaced() {
        let key = nonce_key("site-1", "jti-1");
        assert!(key.starts_with("nonce:"));
        assert_ne!(key, nonce_key("site-1", "jti-2"));
        assert_ne!(key, nonce_key("site-2", "jti-1"));
    }
}
