//! In-memory expiring cache for secret values
//!
//! Entries are keyed by `secret:version` and share a single TTL fixed at
//! construction. Expired entries are evicted lazily by the lookup that finds
//! them, or in bulk by [`SecretCache::purge_expired`]. Failures are never
//! cached.
//!
//! An entry is fresh while its age is at most the TTL. With a TTL of zero an
//! entry is fresh only at the instant it was stored, so any later lookup
//! misses.

use crate::types::SecretValue;
use sakit_core::CacheConfig;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Statistics about cache usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses (including expired lookups)
    pub misses: u64,
    /// Number of expired entries evicted
    pub expired: u64,
    /// Number of stored entries
    pub entries: usize,
}

impl CacheStats {
    /// Get hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// A cached value and when it was stored
#[derive(Debug)]
struct CacheEntry {
    value: SecretValue,
    stored_at: Instant,
}

impl CacheEntry {
    fn new(value: SecretValue) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= ttl
    }

    fn remaining(&self, ttl: Duration, now: Instant) -> Duration {
        ttl.saturating_sub(now.saturating_duration_since(self.stored_at))
    }
}

enum Lookup {
    Absent,
    Fresh(SecretValue),
    Expired,
}

/// Process-local secret cache
pub struct SecretCache {
    ttl: Duration,
    enabled: bool,
    entries: RwLock<HashMap<String, CacheEntry>>,
    stats: RwLock<CacheStats>,
}

impl SecretCache {
    /// Create an enabled cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            enabled: true,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Create a cache from configuration
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(config.ttl())
        }
    }

    /// Create a cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a cached value if present and fresh
    ///
    /// An expired entry is removed and reported as absent.
    pub async fn get(&self, key: &str) -> Option<SecretValue> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let lookup = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => Lookup::Absent,
                Some(entry) if entry.is_fresh(self.ttl, now) => {
                    debug!(
                        key,
                        remaining_secs = entry.remaining(self.ttl, now).as_secs(),
                        "Cache hit"
                    );
                    Lookup::Fresh(entry.value.clone())
                }
                Some(_) => Lookup::Expired,
            }
        };

        match lookup {
            Lookup::Fresh(value) => {
                self.stats.write().await.hits += 1;
                Some(value)
            }
            Lookup::Absent => {
                debug!(key, "Cache miss");
                self.stats.write().await.misses += 1;
                None
            }
            Lookup::Expired => self.evict_expired(key).await,
        }
    }

    /// Remove an entry seen expired, unless a writer replaced it meanwhile
    async fn evict_expired(&self, key: &str) -> Option<SecretValue> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let still_expired = entries
            .get(key)
            .map(|entry| !entry.is_fresh(self.ttl, now));

        match still_expired {
            Some(true) => {
                entries.remove(key);
                drop(entries);
                debug!(key, "Cache entry expired");
                let mut stats = self.stats.write().await;
                stats.expired += 1;
                stats.misses += 1;
                None
            }
            Some(false) => {
                let value = entries.get(key).map(|entry| entry.value.clone());
                drop(entries);
                self.stats.write().await.hits += 1;
                value
            }
            None => {
                drop(entries);
                self.stats.write().await.misses += 1;
                None
            }
        }
    }

    /// Store a value, replacing any existing entry for the key
    pub async fn put(&self, key: &str, value: SecretValue) {
        if !self.enabled {
            return;
        }

        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry::new(value));
        debug!(key, ttl_secs = self.ttl.as_secs(), "Cached secret");
    }

    /// Return the cached value, or run `fetch` and cache its success
    ///
    /// Errors from `fetch` propagate unchanged and leave the cache untouched.
    /// Concurrent misses on the same key may each call `fetch`; the last
    /// write wins.
    pub async fn fetch_with_cache<F, Fut, E>(&self, key: &str, fetch: F) -> Result<SecretValue, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SecretValue, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        self.put(key, value.clone()).await;
        Ok(value)
    }

    /// Remove a single entry; returns whether one was present
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.write().await.remove(key).is_some();
        if removed {
            debug!(key, "Invalidated cache entry");
        }
        removed
    }

    /// Remove every entry
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        debug!(count, "Cleared secret cache");
    }

    /// Remove every expired entry; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
            before - entries.len()
        };

        if removed > 0 {
            self.stats.write().await.expired += removed as u64;
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of the usage counters
    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.entries = self.len().await;
        stats
    }
}

impl std::fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCache")
            .field("ttl", &self.ttl)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::advance;

    fn value(s: &str) -> SecretValue {
        SecretValue::from(s)
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_timeline() {
        let cache = SecretCache::new(Duration::from_secs(5));
        cache.put("api-key:latest", value("abc123")).await;

        advance(Duration::from_secs(3)).await;
        assert_eq!(cache.get("api-key:latest").await, Some(value("abc123")));

        advance(Duration::from_secs(3)).await;
        assert_eq!(cache.get("api-key:latest").await, None);
        assert!(cache.is_empty().await);

        let fetched = cache
            .fetch_with_cache("api-key:latest", || async {
                Ok::<_, String>(value("xyz789"))
            })
            .await
            .unwrap();
        assert_eq!(fetched, value("xyz789"));

        advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("api-key:latest").await, Some(value("xyz789")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_at_exactly_ttl() {
        let cache = SecretCache::new(Duration::from_secs(5));
        cache.put("secretA:latest", value("abc123")).await;

        advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get("secretA:latest").await, Some(value("abc123")));

        advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("secretA:latest").await, None);
    }

    // Real clock: any time between put and get ages the entry past zero
    #[tokio::test]
    async fn test_zero_ttl_never_hits() {
        let cache = SecretCache::new(Duration::ZERO);
        cache.put("k:latest", value("v")).await;
        assert_eq!(cache.get("k:latest").await, None);
    }

    #[tokio::test]
    async fn test_negative_configured_ttl_clamps_to_zero() {
        let config = CacheConfig {
            enabled: true,
            ttl_seconds: -30,
        };
        let cache = SecretCache::from_config(&config);
        assert_eq!(cache.ttl(), Duration::ZERO);

        cache.put("k:latest", value("v")).await;
        assert_eq!(cache.get("k:latest").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_fetches_once_within_ttl() {
        let cache = SecretCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .fetch_with_cache("db:latest", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(value("postgres://u:p@h/db"))
                })
                .await
                .unwrap();
            assert_eq!(got, value("postgres://u:p@h/db"));
            advance(Duration::from_secs(10)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let cache = SecretCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let err = cache
            .fetch_with_cache("k:latest", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<SecretValue, _>("permission denied")
            })
            .await
            .unwrap_err();
        assert_eq!(err, "permission denied");
        assert!(cache.get("k:latest").await.is_none());

        let ok = cache
            .fetch_with_cache("k:latest", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(value("v"))
            })
            .await
            .unwrap();
        assert_eq!(ok, value("v"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_replaces_and_restarts_clock() {
        let cache = SecretCache::new(Duration::from_secs(5));
        cache.put("k:latest", value("old")).await;

        advance(Duration::from_secs(4)).await;
        cache.put("k:latest", value("new")).await;
        assert_eq!(cache.len().await, 1);

        advance(Duration::from_secs(4)).await;
        assert_eq!(cache.get("k:latest").await, Some(value("new")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_versions_are_cached_separately() {
        let cache = SecretCache::new(Duration::from_secs(60));
        cache.put("api-key:1", value("first")).await;
        cache.put("api-key:latest", value("second")).await;

        assert_eq!(cache.get("api-key:1").await, Some(value("first")));
        assert_eq!(cache.get("api-key:latest").await, Some(value("second")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_cache_always_misses() {
        let cache = SecretCache::disabled();
        cache.put("k:latest", value("v")).await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.get("k:latest").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_clear_and_purge() {
        let cache = SecretCache::new(Duration::from_secs(10));
        cache.put("a:latest", value("a")).await;
        advance(Duration::from_secs(6)).await;
        cache.put("b:latest", value("b")).await;
        cache.put("c:latest", value("c")).await;

        assert!(cache.invalidate("c:latest").await);
        assert!(!cache.invalidate("c:latest").await);

        advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats() {
        let cache = SecretCache::new(Duration::from_secs(5));
        cache.get("k:latest").await;
        cache.put("k:latest", value("v")).await;
        cache.get("k:latest").await;
        advance(Duration::from_secs(6)).await;
        cache.get("k:latest").await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.entries, 0);
        assert!((stats.hit_rate() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_keep_one_entry() {
        let cache = Arc::new(SecretCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .fetch_with_cache("api-key:latest", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        if i % 4 == 0 {
                            Err(format!("transient failure {}", i))
                        } else {
                            Ok(value(&format!("v{}", i)))
                        }
                    })
                    .await
            }));
        }

        let written = |v: &SecretValue| {
            v.as_str()
                .and_then(|s| s.strip_prefix('v'))
                .and_then(|n| n.parse::<usize>().ok())
                .is_some_and(|n| n < 32 && n % 4 != 0)
        };

        for handle in handles {
            match handle.await.unwrap() {
                Ok(v) => assert!(written(&v), "unexpected value {:?}", v.as_str()),
                Err(e) => assert!(e.starts_with("transient failure")),
            }
        }

        let calls = calls.load(Ordering::SeqCst);
        assert!((1..=32).contains(&calls));
        assert_eq!(cache.len().await, 1);
        let stored = cache.get("api-key:latest").await.unwrap();
        assert!(written(&stored), "stored {:?}", stored.as_str());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_and_expiry() {
        let ttl = Duration::from_millis(20);
        let cache = Arc::new(SecretCache::new(ttl));

        let mut writers = Vec::new();
        for w in 0..4 {
            let cache = Arc::clone(&cache);
            writers.push(tokio::spawn(async move {
                for n in 0..50 {
                    cache.put("db:latest", value(&format!("w{}-{}", w, n))).await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }));
        }

        let mut readers = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            readers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..100 {
                    if let Some(v) = cache.get("db:latest").await {
                        seen.push(v);
                    }
                    tokio::time::sleep(Duration::from_micros(500)).await;
                }
                seen
            }));
        }

        for writer in writers {
            writer.await.unwrap();
        }
        for reader in readers {
            for v in reader.await.unwrap() {
                let text = v.as_str().unwrap();
                let (w, n) = text
                    .strip_prefix('w')
                    .and_then(|rest| rest.split_once('-'))
                    .unwrap();
                assert!(w.parse::<u32>().unwrap() < 4 && n.parse::<u32>().unwrap() < 50);
            }
        }

        // One key, so at most one entry whatever the interleaving
        assert!(cache.len().await <= 1);

        tokio::time::sleep(ttl * 3).await;
        assert_eq!(cache.get("db:latest").await, None);
        assert!(cache.is_empty().await);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
