//! Main application configuration

use super::{CacheConfig, LoggingConfig, QueueConfig, RateLimitConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Shared backing store
    #[validate(nested)]
    pub store: StoreConfig,

    /// Cache service
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Rate limiter service
    #[validate(nested)]
    pub rate_limit: RateLimitConfig,

    /// Task queue service
    #[validate(nested)]
    pub queue: QueueConfig,

    /// Logging
    pub logging: LoggingConfig,
}
