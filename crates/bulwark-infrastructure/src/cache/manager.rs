//! Cache manager
//!
//! Keys are stored as `{namespace}:{key}`. The backend is chosen once from
//! the store probe: Redis when connected, a local map otherwise. The manager
//! never returns a backend error to the caller.

use crate::config::{CacheConfig, StoreConfig};
use crate::infrastructure::PeriodicTask;
use bulwark_domain::constants::KEY_SEPARATOR;
use bulwark_domain::error::Result;
use bulwark_domain::ports::CacheBackend;
use bulwark_domain::value_objects::{CacheStats, ServiceMode};
use bulwark_providers::store::{ConnectResult, connect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

impl Counters {
    fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

/// Namespaced TTL cache over a local or shared backend
#[derive(Debug)]
pub struct CacheManager {
    backend: Arc<dyn CacheBackend>,
    namespace: String,
    default_ttl: Option<Duration>,
    counters: Counters,
    sweep: Mutex<Option<PeriodicTask>>,
}

impl CacheManager {
    /// Probe the store and build the cache
    ///
    /// Only a malformed store URL is an error; an absent or unreachable
    /// store selects local mode.
    pub async fn new(config: &CacheConfig, store: &StoreConfig) -> Result<Self> {
        let probe = connect(store.url(), store.timeouts()).await?;
        Ok(Self::from_probe(&probe, config))
    }

    /// Build the cache for an existing probe result
    pub fn from_probe(probe: &ConnectResult, config: &CacheConfig) -> Self {
        let backend = bulwark_providers::cache::backend_for(probe);
        match probe.reason() {
            None => info!(
                namespace = %config.namespace,
                mode = %backend.mode(),
                "Cache using shared backing store"
            ),
            Some(reason) => info!(
                namespace = %config.namespace,
                mode = %backend.mode(),
                reason = reason,
                "Cache using local fallback"
            ),
        }
        Self::with_backend(backend, config)
    }

    /// Build the cache over an explicit backend
    pub fn with_backend(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend,
            namespace: config.namespace.clone(),
            default_ttl: config.default_ttl(),
            counters: Counters::default(),
            sweep: Mutex::new(None),
        }
    }

    /// A view over the same backend bound to another namespace
    ///
    /// The view keeps its own statistics and never runs the sweep.
    pub fn namespaced(&self, namespace: &str) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            namespace: namespace.to_string(),
            default_ttl: self.default_ttl,
            counters: Counters::default(),
            sweep: Mutex::new(None),
        }
    }

    /// Namespace of this cache
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Where entries are kept
    pub fn mode(&self) -> ServiceMode {
        self.backend.mode()
    }

    fn key(&self, key: &str) -> String {
        format!("{}{KEY_SEPARATOR}{key}", self.namespace)
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, value: serde_json::Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(namespace = %self.namespace, key = key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    fn record_lookup(&self, hit: bool) {
        if hit {
            Counters::add(&self.counters.hits, 1);
        } else {
            Counters::add(&self.counters.misses, 1);
        }
    }

    /// Get a live value
    ///
    /// Absent, expired, undecodable and unreadable entries are all misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.backend.get(&self.key(key)).await {
            Ok(value) => value.and_then(|v| self.decode(key, v)),
            Err(e) => {
                warn!(namespace = %self.namespace, key = key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };
        self.record_lookup(value.is_some());
        value
    }

    /// Get a live value or `default`
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).await.unwrap_or(default)
    }

    /// Store a value
    ///
    /// `ttl == None` applies the configured default TTL.
    ///
    /// # Returns
    /// False when the value could not be encoded or written
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(namespace = %self.namespace, key = key, error = %e, "Cache value not serializable");
                return false;
            }
        };

        match self
            .backend
            .set(&self.key(key), value, ttl.or(self.default_ttl))
            .await
        {
            Ok(()) => {
                Counters::add(&self.counters.sets, 1);
                true
            }
            Err(e) => {
                warn!(namespace = %self.namespace, key = key, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Delete a key
    ///
    /// # Returns
    /// True if a live entry was removed
    pub async fn delete(&self, key: &str) -> bool {
        match self.backend.delete(&self.key(key)).await {
            Ok(removed) => {
                if removed {
                    Counters::add(&self.counters.deletes, 1);
                }
                removed
            }
            Err(e) => {
                warn!(namespace = %self.namespace, key = key, error = %e, "Cache delete failed");
                false
            }
        }
    }

    /// Whether a live entry exists
    pub async fn exists(&self, key: &str) -> bool {
        match self.backend.exists(&self.key(key)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(namespace = %self.namespace, key = key, error = %e, "Cache exists check failed");
                false
            }
        }
    }

    /// Delete every live key of this namespace matching a glob pattern
    ///
    /// # Returns
    /// Number of keys removed, 0 on failure
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        match self.backend.delete_matching(&self.key(pattern)).await {
            Ok(removed) => {
                Counters::add(&self.counters.deletes, removed as u64);
                debug!(namespace = %self.namespace, pattern = pattern, removed = removed, "Cache pattern invalidated");
                removed
            }
            Err(e) => {
                warn!(namespace = %self.namespace, pattern = pattern, error = %e, "Cache pattern invalidation failed");
                0
            }
        }
    }

    /// Get several values
    ///
    /// # Returns
    /// Only the keys that were found, keyed without the namespace
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[&str]) -> HashMap<String, T> {
        let full_keys: Vec<String> = keys.iter().map(|key| self.key(key)).collect();
        let values = match self.backend.get_many(&full_keys).await {
            Ok(values) => values,
            Err(e) => {
                warn!(namespace = %self.namespace, count = keys.len(), error = %e, "Cache batch read failed, treating as misses");
                vec![None; keys.len()]
            }
        };

        let mut found = HashMap::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            let decoded = value.and_then(|v| self.decode::<T>(key, v));
            self.record_lookup(decoded.is_some());
            if let Some(decoded) = decoded {
                found.insert((*key).to_string(), decoded);
            }
        }
        found
    }

    /// Store several values with the same TTL
    ///
    /// `ttl == None` applies the configured default TTL.
    pub async fn set_many<K, V, I>(&self, entries: I, ttl: Option<Duration>) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        let mut encoded = Vec::new();
        for (key, value) in entries {
            match serde_json::to_value(&value) {
                Ok(value) => encoded.push((self.key(key.as_ref()), value)),
                Err(e) => {
                    warn!(namespace = %self.namespace, key = key.as_ref(), error = %e, "Cache value not serializable");
                    return false;
                }
            }
        }

        let count = encoded.len() as u64;
        match self.backend.set_many(encoded, ttl.or(self.default_ttl)).await {
            Ok(()) => {
                Counters::add(&self.counters.sets, count);
                true
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "Cache batch write failed");
                false
            }
        }
    }

    /// Remove every entry of this namespace
    ///
    /// Other namespaces sharing the backend are left alone.
    pub async fn clear(&self) -> usize {
        let removed = self.invalidate_pattern("*").await;
        info!(namespace = %self.namespace, removed = removed, "Cache cleared");
        removed
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats::from_counters(
            self.counters.hits.load(Ordering::Relaxed),
            self.counters.misses.load(Ordering::Relaxed),
            self.counters.sets.load(Ordering::Relaxed),
            self.counters.deletes.load(Ordering::Relaxed),
            self.mode(),
        )
    }

    /// Remove expired entries from the local map
    ///
    /// # Returns
    /// Entries removed; always 0 in shared mode, where the store expires keys
    pub async fn sweep_expired(&self) -> usize {
        if self.mode().is_shared() {
            return 0;
        }
        match self.backend.purge_expired().await {
            Ok(removed) => {
                if removed > 0 {
                    debug!(namespace = %self.namespace, removed = removed, "Expired cache entries swept");
                }
                removed
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "Cache sweep failed");
                0
            }
        }
    }

    /// Start the periodic expiry sweep
    ///
    /// No task is started in shared mode.
    ///
    /// # Returns
    /// Whether a sweep is now running
    pub fn start_sweep(self: &Arc<Self>, interval: Duration, parent: &CancellationToken) -> bool {
        if self.mode().is_shared() {
            debug!(namespace = %self.namespace, "Shared cache relies on native expiry, no sweep started");
            return false;
        }

        let mut slot = match self.sweep.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            return true;
        }

        let cache = Arc::downgrade(self);
        *slot = Some(PeriodicTask::spawn(
            format!("cache-sweep:{}", self.namespace),
            interval,
            parent,
            move || {
                let cache = cache.clone();
                async move {
                    if let Some(cache) = cache.upgrade() {
                        cache.sweep_expired().await;
                    }
                }
            },
        ));
        true
    }

    /// Whether the periodic sweep is running
    pub fn is_sweeping(&self) -> bool {
        match self.sweep.lock() {
            Ok(guard) => guard.as_ref().is_some_and(PeriodicTask::is_running),
            Err(poisoned) => poisoned.into_inner().as_ref().is_some_and(PeriodicTask::is_running),
        }
    }

    /// Stop the sweep and flush final statistics to the log
    pub async fn shutdown(&self) {
        let task = match self.sweep.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.stop().await;
        }

        let stats = self.stats();
        info!(
            namespace = %self.namespace,
            mode = %stats.mode,
            hits = stats.hits,
            misses = stats.misses,
            sets = stats.sets,
            deletes = stats.deletes,
            hit_rate = stats.hit_rate,
            "Cache shut down"
        );
    }
}
