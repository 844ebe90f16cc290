//! # Bulwark - Backend Implementations
//!
//! Each backend implements a port defined in `bulwark-domain`. Every service
//! has a local variant that needs nothing beyond the process and a shared
//! variant delegating to a Redis-compatible store.
//!
//! ## Backends
//!
//! | Concern | Port | Local | Shared |
//! |---------|------|-------|--------|
//! | Cache | `CacheBackend` | [`cache::LocalCache`] | [`cache::RedisCache`] |
//! | Rate limit | `RateLimitBackend` | [`rate_limit::TokenBucketLimiter`] | [`rate_limit::SlidingWindowLimiter`] |
//! | Job records | `JobStore` | [`queue::LocalJobStore`] | [`queue::RedisJobStore`] |
//! | Job dispatch | `DispatchQueue` | [`queue::MemoryDispatchQueue`] | [`queue::RedisJobStore`] |
//!
//! ## Usage
//!
//! ```ignore
//! use bulwark_providers::store::{connect, StoreTimeouts};
//!
//! let probe = connect(Some("redis://localhost:6379"), StoreTimeouts::default()).await?;
//! let backend = bulwark_providers::cache::backend_for(&probe);
//! ```

pub use bulwark_domain::error::{Error, Result};
pub use bulwark_domain::ports::{
    CacheBackend, DispatchQueue, JobHandler, JobStore, RateLimitBackend,
};

/// Shared store probe and connection handle
pub mod store;

/// Cache backends
pub mod cache;

/// Rate limit backends
pub mod rate_limit;

/// Job record storage and dispatch
pub mod queue;

/// Shared helpers for backend implementations
pub mod utils;
