//! Two-pool result cache shared by all requests

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use crate::domain::cache::{Cache, CacheKeyParams};
use crate::infrastructure::observability::record_cache_lookup;

/// Pool a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePool {
    /// Raw search results, short-lived
    Search,
    /// Reasoned or combined answers, long-lived
    Reasoning,
}

impl CachePool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Reasoning => "reasoning",
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultCacheConfig {
    pub search_ttl_secs: u64,
    pub reasoning_ttl_secs: u64,
    /// Maximum live keys per pool
    pub max_keys: u64,
    /// Keys longer than this collapse to a hash
    pub max_key_length: usize,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: 300,
            reasoning_ttl_secs: 3600,
            max_keys: 1000,
            max_key_length: 250,
        }
    }
}

impl ResultCacheConfig {
    pub fn ttl(&self, pool: CachePool) -> Duration {
        match pool {
            CachePool::Search => Duration::from_secs(self.search_ttl_secs),
            CachePool::Reasoning => Duration::from_secs(self.reasoning_ttl_secs),
        }
    }
}

/// Counters for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub key_count: usize,
}

/// Snapshot of both pools plus totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub search: PoolStats,
    pub reasoning: PoolStats,
    pub total: PoolStats,
}

#[derive(Debug)]
struct PoolState {
    store: Arc<dyn Cache>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PoolState {
    fn new(store: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    async fn stats(&self, pool: CachePool) -> PoolStats {
        let key_count = match self.store.size().await {
            Ok(size) => size,
            Err(e) => {
                warn!(pool = pool.as_str(), error = %e, "Failed to read cache size");
                0
            }
        };

        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            key_count,
        }
    }
}

/// Process-wide result cache with a search pool and a reasoning pool.
///
/// Constructed once and shared through `Arc`. Backing-store failures never
/// surface to callers: a failed read is a miss, a failed write is dropped.
#[derive(Debug)]
pub struct ResultCache {
    search: PoolState,
    reasoning: PoolState,
    max_key_length: usize,
    closed: AtomicBool,
}

impl ResultCache {
    /// Creates a cache backed by two bounded in-memory pools
    pub fn new(config: ResultCacheConfig) -> Self {
        let pool = |pool: CachePool| -> Arc<dyn Cache> {
            Arc::new(InMemoryCache::with_config(
                InMemoryCacheConfig::default()
                    .with_max_capacity(config.max_keys)
                    .with_default_ttl(config.ttl(pool)),
            ))
        };

        Self::with_stores(&config, pool(CachePool::Search), pool(CachePool::Reasoning))
    }

    /// Creates a cache over caller-supplied backing stores
    pub fn with_stores(
        config: &ResultCacheConfig,
        search: Arc<dyn Cache>,
        reasoning: Arc<dyn Cache>,
    ) -> Self {
        info!(
            search_ttl_secs = config.search_ttl_secs,
            reasoning_ttl_secs = config.reasoning_ttl_secs,
            max_keys = config.max_keys,
            "Result cache initialized"
        );

        Self {
            search: PoolState::new(search, config.ttl(CachePool::Search)),
            reasoning: PoolState::new(reasoning, config.ttl(CachePool::Reasoning)),
            max_key_length: config.max_key_length,
            closed: AtomicBool::new(false),
        }
    }

    fn pool(&self, pool: CachePool) -> &PoolState {
        match pool {
            CachePool::Search => &self.search,
            CachePool::Reasoning => &self.reasoning,
        }
    }

    /// Derives the key for `params` in `pool`
    pub fn key(&self, pool: CachePool, params: &CacheKeyParams) -> String {
        params.derive(pool.as_str(), self.max_key_length)
    }

    pub async fn get(&self, pool: CachePool, key: &str) -> Option<String> {
        let state = self.pool(pool);

        let value = match state.store.get_raw(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(pool = pool.as_str(), key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        let hit = value.is_some();
        if hit {
            state.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            state.misses.fetch_add(1, Ordering::Relaxed);
        }
        record_cache_lookup(pool.as_str(), hit);
        debug!(pool = pool.as_str(), key, hit, "Cache lookup");

        value
    }

    /// Stores `value`, replacing any entry and restarting its TTL.
    /// No-op after `shutdown`.
    pub async fn set(&self, pool: CachePool, key: &str, value: &str) {
        if self.closed.load(Ordering::Acquire) {
            debug!(pool = pool.as_str(), key, "Cache closed, skipping write");
            return;
        }

        let state = self.pool(pool);
        if let Err(e) = state.store.set_raw(key, value, state.ttl).await {
            warn!(pool = pool.as_str(), key, error = %e, "Cache write failed");
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let search = self.search.stats(CachePool::Search).await;
        let reasoning = self.reasoning.stats(CachePool::Reasoning).await;

        CacheStats {
            search,
            reasoning,
            total: PoolStats {
                hits: search.hits + reasoning.hits,
                misses: search.misses + reasoning.misses,
                key_count: search.key_count + reasoning.key_count,
            },
        }
    }

    /// Removes every entry from both pools; counters are kept
    pub async fn flush(&self) {
        for pool in [CachePool::Search, CachePool::Reasoning] {
            if let Err(e) = self.pool(pool).store.clear().await {
                warn!(pool = pool.as_str(), error = %e, "Cache flush failed");
            }
        }

        info!("Result cache flushed");
    }

    /// Flushes both pools and rejects further writes
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;

    fn cache() -> ResultCache {
        ResultCache::new(ResultCacheConfig::default())
    }

    #[tokio::test]
    async fn test_round_trip_and_stats() {
        let cache = cache();
        let key = cache.key(CachePool::Search, &CacheKeyParams::new("Canon PG-540").with_mode("deepsearch"));

        assert!(cache.get(CachePool::Search, &key).await.is_none());
        cache.set(CachePool::Search, &key, "answer").await;
        assert_eq!(cache.get(CachePool::Search, &key).await.as_deref(), Some("answer"));

        let stats = cache.stats().await;
        assert_eq!(stats.search.hits, 1);
        assert_eq!(stats.search.misses, 1);
        assert_eq!(stats.search.key_count, 1);
        assert_eq!(stats.reasoning, PoolStats::default());
        assert_eq!(stats.total.key_count, 1);
    }

    #[tokio::test]
    async fn test_pools_are_independent() {
        let cache = cache();
        let params = CacheKeyParams::new("same query").with_mode("deepsearch");
        let search_key = cache.key(CachePool::Search, &params);
        let reasoning_key = cache.key(CachePool::Reasoning, &params);
        assert_ne!(search_key, reasoning_key);

        cache.set(CachePool::Search, &search_key, "raw").await;
        assert!(cache.get(CachePool::Reasoning, &search_key).await.is_none());
    }

    #[tokio::test]
    async fn test_failing_store_never_fails_caller() {
        let config = ResultCacheConfig::default();
        let cache = ResultCache::with_stores(
            &config,
            Arc::new(MockCache::failing("connection refused")),
            Arc::new(MockCache::new()),
        );

        cache.set(CachePool::Search, "k", "v").await;
        assert!(cache.get(CachePool::Search, "k").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.search.misses, 1);
        assert_eq!(stats.search.key_count, 0);
    }

    #[tokio::test]
    async fn test_each_pool_writes_with_its_ttl() {
        let config = ResultCacheConfig::default();
        let search = Arc::new(MockCache::new());
        let reasoning = Arc::new(MockCache::new());
        let cache = ResultCache::with_stores(&config, search.clone(), reasoning.clone());

        cache.set(CachePool::Search, "s", "raw").await;
        cache.set(CachePool::Reasoning, "r", "analysis").await;

        assert_eq!(search.ttl_of("s"), Some(Duration::from_secs(300)));
        assert_eq!(reasoning.ttl_of("r"), Some(Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_flush_clears_both_pools() {
        let cache = cache();
        cache.set(CachePool::Search, "a", "1").await;
        cache.set(CachePool::Reasoning, "b", "2").await;

        cache.flush().await;

        assert_eq!(cache.stats().await.total.key_count, 0);
        assert!(cache.get(CachePool::Reasoning, "b").await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_writes() {
        let cache = cache();
        cache.shutdown().await;

        cache.set(CachePool::Search, "k", "v").await;
        assert!(cache.get(CachePool::Search, "k").await.is_none());
    }

    #[test]
    fn test_long_keys_are_bounded() {
        let cache = ResultCache::new(ResultCacheConfig {
            max_key_length: 64,
            ..Default::default()
        });
        let params = CacheKeyParams::new(&"blekkpatron ".repeat(40)).with_mode("think");

        let key = cache.key(CachePool::Reasoning, &params);
        assert!(key.starts_with("reasoning:h:"));
        assert!(key.len() <= "reasoning:h:".len() + 64);
    }
}
