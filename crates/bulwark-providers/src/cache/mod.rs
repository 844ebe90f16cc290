//! Cache Backend Implementations
//!
//! | Backend | Mode | Description |
//! |---------|------|-------------|
//! | [`LocalCache`] | Local | Concurrent map, lazy expiry plus periodic sweep |
//! | [`RedisCache`] | Shared | JSON text values with native key expiry |

pub mod local;
pub mod redis;

pub use local::LocalCache;
pub use redis::RedisCache;

use crate::store::ConnectResult;
use bulwark_domain::ports::CacheBackend;
use std::sync::Arc;

/// Select the cache backend for a probe result
pub fn backend_for(probe: &ConnectResult) -> Arc<dyn CacheBackend> {
    match probe {
        ConnectResult::Connected(store) => Arc::new(RedisCache::new(store.clone())),
        _ => Arc::new(LocalCache::new()),
    }
}
