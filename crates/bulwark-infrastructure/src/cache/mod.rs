//! Degradable cache service
//!
//! [`CacheManager`] namespaces keys, applies the default TTL, keeps hit/miss
//! statistics and turns every backend failure into a miss or a failed write.

mod manager;

pub use manager::CacheManager;
