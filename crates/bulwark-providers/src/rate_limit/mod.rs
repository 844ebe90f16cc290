//! Rate Limit Backend Implementations
//!
//! | Backend | Mode | Algorithm |
//! |---------|------|-----------|
//! | [`TokenBucketLimiter`] | Local | Token bucket with lazy linear refill |
//! | [`SlidingWindowLimiter`] | Shared | Sorted-set request log in one MULTI/EXEC |

pub mod sliding_window;
pub mod token_bucket;

pub use sliding_window::SlidingWindowLimiter;
pub use token_bucket::TokenBucketLimiter;

use crate::store::ConnectResult;
use bulwark_domain::ports::RateLimitBackend;
use std::sync::Arc;

/// Select the rate limit backend for a probe result
///
/// `max_local_buckets` bounds the token bucket table in local mode.
pub fn backend_for(probe: &ConnectResult, max_local_buckets: usize) -> Arc<dyn RateLimitBackend> {
    match probe {
        ConnectResult::Connected(store) => Arc::new(SlidingWindowLimiter::new(store.clone())),
        _ => Arc::new(TokenBucketLimiter::new(max_local_buckets)),
    }
}
