//! Degradable rate limiter
//!
//! [`RateLimiter`] resolves the limit of an endpoint class and delegates the
//! admission decision to the sliding-window log (shared) or the token bucket
//! table (local).

mod limiter;

pub use limiter::RateLimiter;
