//! Port traits
//!
//! Seams between the services and their backends. Every port has a local
//! implementation and a shared-store implementation in `bulwark-providers`.

pub mod cache;
pub mod jobs;
pub mod rate_limit;

pub use cache::CacheBackend;
pub use jobs::{DispatchQueue, JobHandler, JobStore};
pub use rate_limit::RateLimitBackend;
