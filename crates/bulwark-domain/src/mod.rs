//! # Bulwark Domain
//!
//! Entities, value objects, errors and port traits for the infrastructure
//! resilience layer: a TTL cache, a request rate limiter and a background
//! task queue. Each runs against a shared backing store when one is
//! reachable and degrades to in-process state when it is not.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`error`] | `Error`, `Result`, `HandlerError` |
//! | [`constants`] | Keyspace layout and policy defaults |
//! | [`value_objects`] | CacheEntry, TokenBucket, RateLimitInfo, Job, ... |
//! | [`ports`] | CacheBackend, RateLimitBackend, JobStore, DispatchQueue, JobHandler |

pub mod constants;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, HandlerError, Result};
