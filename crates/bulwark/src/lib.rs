//! # Bulwark
//!
//! A TTL cache, a rate limiter and a background task queue that share one
//! optional Redis-compatible backing store. Each service probes the store
//! once when it is built: reachable means shared mode for its lifetime,
//! absent or unreachable means a local in-process fallback.
//!
//! ## Example
//!
//! ```ignore
//! use bulwark::infrastructure::AppContext;
//! use bulwark::infrastructure::config::ConfigLoader;
//!
//! let context = AppContext::init(ConfigLoader::new().load()?).await?;
//!
//! let cache = context.cache();
//! cache.set("user:1", "Ann", None).await;
//!
//! let info = context.rate_limiter().check("ip:1.2.3.4", "search").await;
//! if !info.allowed {
//!     // reply 429 with info.headers() and info.rejection()
//! }
//!
//! context.shutdown().await;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Entities, value objects, errors and port traits
//! - `providers` - Local and Redis implementations of the ports
//! - `infrastructure` - Services, configuration, logging and lifecycle

/// Domain layer - entities, value objects and ports
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use bulwark_domain::*;
}

/// Providers - backend implementations of the ports
///
/// Re-exports from the providers crate for convenience
pub mod providers {
    pub use bulwark_providers::*;
}

/// Infrastructure layer - services, config and application context
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use bulwark_infrastructure::*;
}

pub mod cli;

// Re-export commonly used types at the crate root
pub use domain::error::{Error, Result};
pub use domain::value_objects::{
    EnqueueOptions, Job, JobArgs, JobDefinition, JobId, JobName, JobPriority, JobStatus,
    RateLimitInfo, RateLimitSpec, ServiceMode,
};
pub use infrastructure::cache::CacheManager;
pub use infrastructure::queue::TaskQueue;
pub use infrastructure::rate_limit::RateLimiter;
pub use infrastructure::{AppContext, ServiceModes};
