//! Cache Backend Port
//!
//! Keys reaching a backend are already namespaced (`{namespace}:{key}`);
//! backends never add or strip prefixes.

use crate::error::Result;
use crate::value_objects::ServiceMode;
use async_trait::async_trait;
use std::time::Duration;

/// Cache Backend Port
///
/// Storage for JSON values with optional per-entry TTL.
///
/// # Implementations
///
/// - **Local**: concurrent map with lazy expiry and a periodic sweep
/// - **Redis**: values serialised to text, native key expiry
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Get a live value
    ///
    /// # Returns
    /// `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store a value, replacing any previous one
    ///
    /// # Arguments
    /// * `key` - Namespaced key
    /// * `value` - Value to store
    /// * `ttl` - Time to live, `None` never expires
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) -> Result<()>;

    /// Delete a key
    ///
    /// # Returns
    /// True if a live entry was removed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check whether a live entry exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Get several values, positionally aligned with `keys`
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<serde_json::Value>>>;

    /// Store several values with the same TTL
    async fn set_many(
        &self,
        entries: Vec<(String, serde_json::Value)>,
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Delete every live key matching a glob pattern
    ///
    /// # Returns
    /// Number of keys removed
    async fn delete_matching(&self, pattern: &str) -> Result<usize>;

    /// Remove expired entries proactively
    ///
    /// # Returns
    /// Number of entries removed; always 0 for stores with native expiry
    async fn purge_expired(&self) -> Result<usize>;

    /// Where this backend keeps its state
    fn mode(&self) -> ServiceMode;

    /// Backend identifier (e.g. "local", "redis")
    fn backend_name(&self) -> &str;
}
