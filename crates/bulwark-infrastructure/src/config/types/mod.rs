//! Configuration types module

pub mod app;
pub mod cache;
pub mod logging;
pub mod queue;
pub mod rate_limit;
pub mod store;

// Re-export main types
pub use app::AppConfig;
pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use queue::QueueConfig;
pub use rate_limit::RateLimitConfig;
pub use store::StoreConfig;
