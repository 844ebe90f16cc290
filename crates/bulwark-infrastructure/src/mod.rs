//! # Infrastructure Layer
//!
//! The degradable services built on the domain ports and the provider
//! backends, plus the ambient plumbing around them.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | [`CacheManager`](cache::CacheManager), namespaced fail-open cache |
//! | [`rate_limit`] | [`RateLimiter`](rate_limit::RateLimiter), fail-open admission control |
//! | [`queue`] | [`TaskQueue`](queue::TaskQueue), registry, executor, pool and worker |
//! | [`config`] | Layered configuration loading and validation |
//! | [`logging`] | Tracing subscriber setup |
//! | [`infrastructure`] | Shutdown coordination and periodic tasks |
//! | [`di`] | [`AppContext`](di::AppContext) composition root |
//!
//! Each service probes the backing store once when it is built. A reachable
//! store puts it in shared mode for its whole lifetime; an absent or
//! unreachable store puts it in local mode with no later re-probe.

pub mod cache;
pub mod config;
pub mod constants;
pub mod di;
pub mod error_ext;
pub mod infrastructure;
pub mod logging;
pub mod queue;
pub mod rate_limit;
pub mod utils;

pub use di::{AppContext, ServiceModes};
pub use error_ext::ErrorContext;
pub use utils::TimedOperation;
