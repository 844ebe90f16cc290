//! In-process cache backend
//!
//! Entries carry their own TTL and are checked on every read. Expired entries
//! stay in the map until a read touches them or [`LocalCache::purge_expired`]
//! runs, so the map is bounded only by the sweep cadence.

use async_trait::async_trait;
use bulwark_domain::error::{Error, Result};
use bulwark_domain::ports::CacheBackend;
use bulwark_domain::value_objects::{CacheEntry, ServiceMode};
use dashmap::DashMap;
use globset::Glob;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// DashMap-backed cache
#[derive(Debug, Clone, Default)]
pub struct LocalCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl LocalCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_value(&self, key: &str, now: Instant) -> Option<serde_json::Value> {
        // Read guard must be released before remove_if takes the shard lock
        let state = self
            .entries
            .get(key)
            .map(|entry| (entry.is_expired_at(now), entry.value.clone()));

        match state {
            Some((false, value)) => Some(value),
            Some((true, _)) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired_at(now));
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CacheBackend for LocalCache {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.live_value(key, Instant::now()))
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> Result<()> {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired_at(now)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_value(key, Instant::now()).is_some())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<serde_json::Value>>> {
        let now = Instant::now();
        Ok(keys.iter().map(|key| self.live_value(key, now)).collect())
    }

    async fn set_many(
        &self,
        entries: Vec<(String, serde_json::Value)>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key, CacheEntry::new(value, ttl));
        }
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let matcher = Glob::new(pattern)
            .map_err(|e| Error::invalid_argument(format!("Invalid key pattern '{pattern}': {e}")))?
            .compile_matcher();

        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            if !matcher.is_match(key) {
                return true;
            }
            if !entry.is_expired_at(now) {
                removed += 1;
            }
            false
        });
        Ok(removed)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired_at(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        Ok(removed)
    }

    fn mode(&self) -> ServiceMode {
        ServiceMode::Local
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}
