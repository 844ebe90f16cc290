//! Cache configuration types

use bulwark_domain::constants::{
    CACHE_SWEEP_INTERVAL_SECS, DEFAULT_CACHE_NAMESPACE, DEFAULT_CACHE_TTL_SECS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Namespace for cache keys
    #[validate(length(min = 1, max = 64))]
    pub namespace: String,

    /// TTL applied when `set` is called without one; `None` never expires
    pub default_ttl_secs: Option<u64>,

    /// Interval of the local expiry sweep in seconds
    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Default TTL as a duration
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_secs.map(Duration::from_secs)
    }

    /// Sweep interval as a duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            default_ttl_secs: Some(DEFAULT_CACHE_TTL_SECS),
            sweep_interval_secs: CACHE_SWEEP_INTERVAL_SECS,
        }
    }
}
