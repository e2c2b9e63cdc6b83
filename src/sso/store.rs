//! Shared TTL-keyed store used for nonce burning, rate-limit counters and
//! session records.
//!
//! The trait models the external cache service: string values, per-key TTL,
//! no explicit deletion. `add_if_absent` is atomic so single-use checks do
//! not race between check and write.

use async_trait::async_trait;
use moka::{future::Cache, Expiry};
use std::time::{Duration, Instant};

#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Atomically record `key` if it is not already present.
    /// Returns `true` when the key was newly added.
    async fn add_if_absent(&self, key: &str, ttl: Duration) -> bool;

    /// Increment the counter at `key`, resetting its TTL to `ttl`.
    /// Returns the new count.
    async fn increment(&self, key: &str, ttl: Duration) -> u64;

    /// Current counter value, `0` when absent or expired.
    async fn count(&self, key: &str) -> u64;

    /// Store an opaque value under `key`.
    async fn put(&self, key: &str, value: String, ttl: Duration);

    /// Fetch the value under `key`, if still live.
    async fn get(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug)]
struct StoredEntry {
    value: String,
    expires_at: Instant,
}

/// Per-entry expiry: each record carries its own absolute deadline, applied
/// on insert and refreshed on update (counter increments reset the window).
struct EntryExpiry;

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(updated_at))
    }
}

/// In-process [`TtlStore`] backed by a [`moka::future::Cache`].
///
/// Suitable for a single-node deployment and for tests; a horizontally
/// scaled deployment swaps in a store shared between nodes.
pub struct InMemoryTtlStore {
    entries: Cache<String, StoredEntry>,
}

const DEFAULT_CAPACITY: u64 = 100_000;

impl InMemoryTtlStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Capacity bounds memory as a safety net beyond per-entry TTL.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();
        Self { entries }
    }
}

impl Default for InMemoryTtlStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtlStore for InMemoryTtlStore {
    async fn add_if_absent(&self, key: &str, ttl: Duration) -> bool {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert(StoredEntry {
                value: "1".to_string(),
                expires_at: Instant::now() + ttl,
            })
            .await;
        entry.is_fresh()
    }

    async fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let entry = self
            .entries
            .entry(key.to_string())
            .and_upsert_with(|current| {
                let count = current
                    .and_then(|entry| entry.value().value.parse::<u64>().ok())
                    .unwrap_or(0)
                    .saturating_add(1);
                std::future::ready(StoredEntry {
                    value: count.to_string(),
                    expires_at: Instant::now() + ttl,
                })
            })
            .await;
        entry.value().value.parse::<u64>().unwrap_or(0)
    }

    async fn count(&self, key: &str) -> u64 {
        self.entries
            .get(key)
            .await
            .and_then(|entry| entry.value.parse::<u64>().ok())
            .unwrap_or(0)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .insert(
                key.to_string(),
                StoredEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            )
            .await;
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await.map(|entry| entry.value)
    }
}
