//! Configuration
//!
//! Typed sections merged by [`ConfigLoader`] from defaults, a TOML file and
//! the environment.

pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, validate_app_config};
pub use types::{
    AppConfig, CacheConfig, LoggingConfig, QueueConfig, RateLimitConfig, StoreConfig,
};
