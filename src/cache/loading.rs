//! Self-loading cache.
//!
//! [`LoadingCache`] computes missing values through a [`Loader`] and
//! memoizes them. Concurrent misses for the same key are coalesced: the
//! loader runs once and every waiter receives the same value or the same
//! error. Errors are never cached, so the next lookup retries. A loader that
//! wants a failure to stick returns it as a value instead (the favicon cache
//! does this with [`CachedIcon::Absent`](super::CachedIcon::Absent)).
//!
//! Backed by moka's async cache with LRU eviction, sized and aged from a
//! [`CacheSpec`]. An instance is never reconfigured in place;
//! [`LoadingCache::rebuild`] produces a fresh, independent instance.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::Result;
use crate::spec::CacheSpec;
use crate::telemetry;

/// Computes the value for a missing key.
#[async_trait]
pub trait Loader<K, V>: Send + Sync {
    async fn load(&self, key: &K) -> Result<V>;
}

/// A keyed cache that loads missing values on demand.
pub struct LoadingCache<K, V> {
    name: &'static str,
    spec: CacheSpec,
    cache: Cache<K, V>,
    loader: Arc<dyn Loader<K, V>>,
}

impl<K, V> LoadingCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Build an empty cache from a parsed policy.
    ///
    /// `name` labels the cache in logs and metrics.
    pub fn new(name: &'static str, spec: &CacheSpec, loader: Arc<dyn Loader<K, V>>) -> Self {
        let mut builder = Cache::builder()
            .name(name)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(max) = spec.maximum_size {
            builder = builder.max_capacity(max);
        }
        if let Some(capacity) = spec.initial_capacity {
            builder = builder.initial_capacity(capacity);
        }
        if let Some(ttl) = spec.expire_after_write {
            builder = builder.time_to_live(ttl);
        }
        if let Some(tti) = spec.expire_after_access {
            builder = builder.time_to_idle(tti);
        }

        Self {
            name,
            spec: spec.clone(),
            cache: builder.build(),
            loader,
        }
    }

    /// Build a fresh instance with a new policy and the same loader.
    ///
    /// The new instance starts empty and shares nothing else with `self`.
    pub fn rebuild(&self, spec: &CacheSpec) -> Self {
        Self::new(self.name, spec, Arc::clone(&self.loader))
    }

    /// Return the cached value for `key`, loading it on a miss.
    ///
    /// With `recordStats`, a call counts as a hit only if the value was
    /// already cached when it arrived. Callers that waited on another
    /// caller's load count as misses.
    pub async fn get(&self, key: &K) -> Result<V> {
        if let Some(value) = self.cache.get(key).await {
            self.record_lookup(telemetry::CACHE_HITS_TOTAL);
            return Ok(value);
        }

        let init = self.loader.load(key);
        match self.cache.entry_by_ref(key).or_try_insert_with(init).await {
            Ok(entry) => {
                self.record_lookup(telemetry::CACHE_MISSES_TOTAL);
                if entry.is_fresh() && self.spec.maximum_size.is_some() {
                    // moka evicts lazily; apply the size bound before returning.
                    self.cache.run_pending_tasks().await;
                }
                Ok(entry.into_value())
            }
            Err(err) => {
                metrics::counter!(telemetry::CACHE_LOAD_FAILURES_TOTAL, "cache" => self.name)
                    .increment(1);
                Err((*err).clone())
            }
        }
    }

    fn record_lookup(&self, metric: &'static str) {
        if self.spec.record_stats {
            metrics::counter!(metric, "cache" => self.name).increment(1);
        }
    }

    /// Whether `key` currently has a cached value.
    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }

    /// Evict every entry. Loads already in flight still complete for their
    /// waiters.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Apply pending evictions and expirations now.
    pub async fn cleanup(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Approximate number of cached entries; exact after [`cleanup`](Self::cleanup).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// The policy this instance was built from.
    pub fn spec(&self) -> &CacheSpec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<K, V> fmt::Debug for LoadingCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingCache")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}
