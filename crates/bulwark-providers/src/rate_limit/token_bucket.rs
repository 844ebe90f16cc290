//! Local token bucket limiter
//!
//! One [`TokenBucket`] per key, refilled lazily at check time. Each key is
//! updated under its DashMap shard lock, so concurrent checks for the same
//! key are serialised.

use crate::utils::now_unix_secs;
use async_trait::async_trait;
use bulwark_domain::error::Result;
use bulwark_domain::ports::RateLimitBackend;
use bulwark_domain::value_objects::{
    RateLimitInfo, RateLimitSpec, ServiceMode, TokenBucket, ceil_secs,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct BucketSlot {
    bucket: TokenBucket,
    spec: RateLimitSpec,
}

/// In-process token bucket limiter
#[derive(Debug, Clone)]
pub struct TokenBucketLimiter {
    buckets: Arc<DashMap<String, BucketSlot>>,
    max_buckets: usize,
}

impl TokenBucketLimiter {
    /// Create a limiter holding at most roughly `max_buckets` keys
    pub fn new(max_buckets: usize) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_buckets: max_buckets.max(1),
        }
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no key is tracked
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop buckets back at capacity, then the least recently used ones
    fn prune(&self, now: Instant) {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, slot| !slot.bucket.is_full_at(&slot.spec, now));

        if self.buckets.len() > self.max_buckets {
            let mut by_age: Vec<(String, Instant)> = self
                .buckets
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().bucket.last_update))
                .collect();
            by_age.sort_by_key(|(_, last_update)| *last_update);

            let excess = self.buckets.len().saturating_sub(self.max_buckets);
            for (key, _) in by_age.into_iter().take(excess) {
                self.buckets.remove(&key);
            }
        }

        debug!(
            before = before,
            after = self.buckets.len(),
            "Pruned local rate limit buckets"
        );
    }
}

#[async_trait]
impl RateLimitBackend for TokenBucketLimiter {
    async fn check(&self, key: &str, spec: &RateLimitSpec) -> Result<RateLimitInfo> {
        let now = Instant::now();
        if self.buckets.len() > self.max_buckets {
            self.prune(now);
        }

        let decision = {
            let mut slot = self
                .buckets
                .entry(key.to_string())
                .or_insert_with(|| BucketSlot {
                    bucket: TokenBucket::full(spec, now),
                    spec: *spec,
                });
            slot.spec = *spec;
            slot.bucket.try_acquire(spec, now)
        };

        let now_epoch = now_unix_secs();
        Ok(RateLimitInfo {
            allowed: decision.allowed,
            limit: spec.limit,
            remaining: decision.remaining,
            reset_at: now_epoch + decision.time_to_full.as_secs_f64().ceil() as u64,
            retry_after: decision.retry_after.map(ceil_secs),
            window_secs: spec.window_secs(),
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        self.buckets.remove(key);
        Ok(())
    }

    fn mode(&self) -> ServiceMode {
        ServiceMode::Local
    }

    fn backend_name(&self) -> &str {
        "token_bucket"
    }
}
