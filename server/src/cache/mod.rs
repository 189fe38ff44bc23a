//! Process-local response cache with per-entry time-to-live.
//!
//! Entries are keyed by normalized request parameters (see [`keys`]) and
//! expire according to the category policy in [`ttl`]. Expired entries read
//! as absent and are dropped lazily by moka's housekeeping.

pub mod keys;
pub mod ttl;

use moka::{future::Cache, Expiry};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

#[derive(Clone, Debug)]
struct Slot<V> {
    value: V,
    ttl: Duration,
}

/// Expiry measured from the latest write, so an overwrite also resets the
/// entry's lifetime to the new TTL.
struct SlotExpiry;

impl<V> Expiry<String, Slot<V>> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        slot: &Slot<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(slot.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &Slot<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(slot.ttl)
    }
}

/// Result of [`TtlCache::get_or_fetch`].
#[derive(Debug, Clone)]
pub struct Lookup<V> {
    pub value: V,
    /// `true` when the value came from the cache (or from another request's
    /// in-flight fetch) rather than from this call's own fetch.
    pub cached: bool,
}

#[derive(Default, Debug)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CacheStats {
    pub entries: u64,
    pub max_entries: u64,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups served from cache (0-100).
    pub hit_rate: f64,
}

pub struct TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<String, Slot<V>>,
    counters: Arc<Counters>,
    max_entries: u64,
}

impl<V> Clone for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            counters: Arc::clone(&self.counters),
            max_entries: self.max_entries,
        }
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(SlotExpiry)
            .build();

        tracing::info!(max_entries, "response cache initialized");

        Self {
            inner,
            counters: Arc::new(Counters::default()),
            max_entries,
        }
    }

    /// Returns the stored value iff its expiry has not been reached.
    pub async fn get(&self, key: &str) -> Option<V> {
        match self.inner.get(key).await {
            Some(slot) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(slot.value)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `value` until `now + ttl`, replacing any previous entry. A zero
    /// TTL removes the key instead.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        if ttl.is_zero() {
            self.inner.invalidate(&key).await;
            return;
        }
        self.inner.insert(key, Slot { value, ttl }).await;
    }

    pub async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Returns the cached value for `key`, or runs `fetch` to produce it.
    ///
    /// Concurrent callers that miss on the same key share one in-flight
    /// `fetch`. A failed fetch is handed to every waiter and nothing is
    /// stored, so the next call tries the upstream again.
    pub async fn get_or_fetch<F, E>(&self, key: &str, fetch: F) -> Result<Lookup<V>, E>
    where
        F: Future<Output = Result<(V, Duration), E>>,
        E: Clone + Send + Sync + 'static,
    {
        let entry = self
            .inner
            .entry_by_ref(key)
            .or_try_insert_with(async move {
                let (value, ttl) = fetch.await?;
                Ok::<_, E>(Slot { value, ttl })
            })
            .await
            .map_err(|shared: Arc<E>| Arc::try_unwrap(shared).unwrap_or_else(|e| (*e).clone()))?;

        let cached = !entry.is_fresh();
        if cached {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, "cache hit");
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, "cache miss, stored fresh value");
        }

        Ok(Lookup {
            value: entry.into_value().value,
            cached,
        })
    }

    /// Applies pending evictions so that counts reflect expired entries.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.sync().await;
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        };

        CacheStats {
            entries: self.inner.entry_count(),
            max_entries: self.max_entries,
            hits,
            misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_get_before_and_after_expiry() {
        let cache = TtlCache::new(100);
        cache.set("weather:36.03:-86.78", 72, Duration::from_millis(200)).await;

        assert_eq!(cache.get("weather:36.03:-86.78").await, Some(72));

        sleep(Duration::from_millis(350)).await;
        assert_eq!(cache.get("weather:36.03:-86.78").await, None);
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let cache: TtlCache<String> = TtlCache::new(100);
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let cache = TtlCache::new(100);
        cache.set("k", "v1".to_string(), Duration::from_millis(100)).await;
        cache.set("k", "v2".to_string(), Duration::from_secs(30)).await;

        sleep(Duration::from_millis(250)).await;
        assert_eq!(cache.get("k").await, Some("v2".to_string()));

        // Shortening works the same way.
        cache.set("k", "v3".to_string(), Duration::from_millis(100)).await;
        sleep(Duration::from_millis(250)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_stored() {
        let cache = TtlCache::new(100);
        cache.set("k", 1, Duration::from_secs(10)).await;
        cache.set("k", 2, Duration::ZERO).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = TtlCache::new(100);
        cache.set("a", 1, Duration::from_secs(60)).await;
        cache.set("b", 2, Duration::from_secs(60)).await;
        cache.set("c", 3, Duration::from_secs(60)).await;

        cache.delete("a").await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));

        cache.clear();
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("c").await, None);
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_success() {
        let cache = TtlCache::new(100);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let lookup = cache
                .get_or_fetch("iss:current", async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>((42, Duration::from_secs(60)))
                })
                .await
                .unwrap();
            assert_eq!(lookup.value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_get_or_fetch_reports_cache_hits() {
        let cache = TtlCache::new(100);
        let first = cache
            .get_or_fetch("k", async { Ok::<_, String>((1, Duration::from_secs(60))) })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("k", async { Ok::<_, String>((2, Duration::from_secs(60))) })
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.value, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = TtlCache::new(100);

        let failed = cache
            .get_or_fetch("apod:today", async {
                Err::<(i32, Duration), _>("upstream down".to_string())
            })
            .await;
        assert_eq!(failed.unwrap_err(), "upstream down");
        assert_eq!(cache.get("apod:today").await, None);

        let recovered = cache
            .get_or_fetch("apod:today", async { Ok::<_, String>((7, Duration::from_secs(60))) })
            .await
            .unwrap();
        assert_eq!(recovered.value, 7);
        assert!(!recovered.cached);
    }

    #[tokio::test]
    async fn test_fetched_value_expires() {
        let cache = TtlCache::new(100);
        cache
            .get_or_fetch("k", async { Ok::<_, String>((1, Duration::from_millis(100))) })
            .await
            .unwrap();

        sleep(Duration::from_millis(250)).await;

        let refetched = cache
            .get_or_fetch("k", async { Ok::<_, String>((2, Duration::from_secs(60))) })
            .await
            .unwrap();
        assert_eq!(refetched.value, 2);
        assert!(!refetched.cached);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache = TtlCache::new(100);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("weather:64.84:-147.72", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(100)).await;
                        Ok::<_, String>(("cold".to_string(), Duration::from_secs(300)))
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut fresh = 0;
        for handle in handles {
            let lookup = handle.await.unwrap();
            assert_eq!(lookup.value, "cold");
            if !lookup.cached {
                fresh += 1;
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fresh, 1);
    }
}
