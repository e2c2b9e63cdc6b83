//! Per-client failure throttling backed by the shared TTL store.
//!
//! The counter tracks request volume, not signature validity: a client
//! replaying well-signed but expired tokens is throttled exactly like one
//! sending garbage, so every rejection path records a failure.

use crate::sso::store::TtlStore;
use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
    max: u32,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>, max: u32, window_seconds: u64) -> Self {
        Self {
            store,
            max,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Whether `ip` has exhausted its failure budget.
    pub async fn is_locked(&self, ip: &str) -> bool {
        self.store.count(&failure_key(ip)).await >= u64::from(self.max)
    }

    /// Record one failed attempt for `ip`, resetting the lockout window.
    /// Returns the updated count.
    pub async fn record_failure(&self, ip: &str) -> u64 {
        self.store.increment(&failure_key(ip), self.window).await
    }
}

fn failure_key(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    format!("throttle:{}", Base64UrlUnpadded::encode_string(&hasher.finalize()))
}
