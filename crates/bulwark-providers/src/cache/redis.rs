//! Redis cache backend
//!
//! Values are stored as JSON text. Expiry is delegated to the server through
//! `SET ... PX`, so [`RedisCache::purge_expired`] has nothing to do.

use crate::store::{SharedStore, ttl_millis};
use async_trait::async_trait;
use bulwark_domain::error::Result;
use bulwark_domain::ports::CacheBackend;
use bulwark_domain::value_objects::ServiceMode;
use std::time::Duration;
use tracing::debug;

/// Keys requested per `SCAN` iteration
const SCAN_BATCH_SIZE: usize = 500;

/// Redis-backed cache
#[derive(Debug, Clone)]
pub struct RedisCache {
    store: SharedStore,
}

impl RedisCache {
    /// Create a cache over a connected store
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn set_command(key: &str, payload: String, ttl: Option<Duration>) -> redis::Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(payload);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        cmd
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut conn = self.store.connection();
        let raw: Option<String> = self
            .store
            .run("GET", redis::cmd("GET").arg(key).query_async(&mut conn))
            .await?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> Result<()> {
        let payload = serde_json::to_string(&value)?;
        let mut conn = self.store.connection();
        let cmd = Self::set_command(key, payload, ttl);
        self.store
            .run("SET", cmd.query_async::<()>(&mut conn))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.store.connection();
        let removed: i64 = self
            .store
            .run("DEL", redis::cmd("DEL").arg(key).query_async(&mut conn))
            .await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.store.connection();
        let count: i64 = self
            .store
            .run("EXISTS", redis::cmd("EXISTS").arg(key).query_async(&mut conn))
            .await?;
        Ok(count > 0)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<serde_json::Value>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.store.connection();
        let raw: Vec<Option<String>> = self
            .store
            .run("MGET", redis::cmd("MGET").arg(keys).query_async(&mut conn))
            .await?;

        raw.into_iter()
            .map(|value| match value {
                Some(text) => Ok(Some(serde_json::from_str(&text)?)),
                None => Ok(None),
            })
            .collect()
    }

    async fn set_many(
        &self,
        entries: Vec<(String, serde_json::Value)>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            let payload = serde_json::to_string(&value)?;
            pipe.add_command(Self::set_command(&key, payload, ttl)).ignore();
        }

        let mut conn = self.store.connection();
        self.store
            .run("MULTI/SET", pipe.query_async::<()>(&mut conn))
            .await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.store.connection();
        let mut deleted = 0usize;
        let mut cursor: u64 = 0;

        // SCAN keeps the server responsive where KEYS would block it
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = self
                .store
                .run(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH_SIZE)
                        .query_async(&mut conn),
                )
                .await?;

            if !keys.is_empty() {
                let count: usize = self
                    .store
                    .run("DEL", redis::cmd("DEL").arg(&keys).query_async(&mut conn))
                    .await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = pattern, deleted = deleted, "Cache pattern delete");
        Ok(deleted)
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    fn mode(&self) -> ServiceMode {
        ServiceMode::Shared
    }

    fn backend_name(&self) -> &str {
        "redis"
    }
}
