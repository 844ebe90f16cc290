//! Rate Limit Backend Port

use crate::error::Result;
use crate::value_objects::{RateLimitInfo, RateLimitSpec, ServiceMode};
use async_trait::async_trait;

/// Rate Limit Backend Port
///
/// Answers "is this request admitted?" for one key under one spec.
///
/// # Implementations
///
/// - **Token bucket** (local): smooths bursts with linear refill
/// - **Sliding-window log** (shared): exact count over the trailing window
#[async_trait]
pub trait RateLimitBackend: Send + Sync + std::fmt::Debug {
    /// Record one request for `key` and decide whether it is admitted
    async fn check(&self, key: &str, spec: &RateLimitSpec) -> Result<RateLimitInfo>;

    /// Forget all state held for `key`
    async fn reset(&self, key: &str) -> Result<()>;

    /// Where this backend keeps its state
    fn mode(&self) -> ServiceMode;

    /// Backend identifier (e.g. "token_bucket", "sliding_window")
    fn backend_name(&self) -> &str;
}
