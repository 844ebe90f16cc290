//! Shared sliding-window log limiter
//!
//! Each key is a sorted set of request timestamps. Prune, count, append and
//! expire run in a single `MULTI/EXEC`, so concurrent callers on any number
//! of processes never lose an update.

use crate::store::SharedStore;
use crate::utils::{now_unix_f64, now_unix_secs};
use async_trait::async_trait;
use bulwark_domain::error::Result;
use bulwark_domain::ports::RateLimitBackend;
use bulwark_domain::value_objects::{RateLimitInfo, RateLimitSpec, ServiceMode};
use tracing::debug;
use uuid::Uuid;

/// Redis sorted-set limiter
#[derive(Debug, Clone)]
pub struct SlidingWindowLimiter {
    store: SharedStore,
}

impl SlidingWindowLimiter {
    /// Create a limiter over a connected store
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RateLimitBackend for SlidingWindowLimiter {
    async fn check(&self, key: &str, spec: &RateLimitSpec) -> Result<RateLimitInfo> {
        let now = now_unix_f64();
        let window_start = now - spec.window.as_secs_f64();
        let window_secs = spec.window_secs().max(1);
        // Unique member so simultaneous requests are all counted
        let member = format!("{now:.6}-{}", Uuid::new_v4());

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(window_start)
            .ignore()
            .cmd("ZCARD")
            .arg(key)
            .cmd("ZADD")
            .arg(key)
            .arg(now)
            .arg(&member)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .ignore();

        let mut conn = self.store.connection();
        let (count,): (u64,) = self
            .store
            .run("MULTI/ZCARD", pipe.query_async(&mut conn))
            .await?;

        let limit = u64::from(spec.limit);
        let reset_at = now_unix_secs() + window_secs;

        if count >= limit {
            let _: i64 = self
                .store
                .run(
                    "ZREM",
                    redis::cmd("ZREM").arg(key).arg(&member).query_async(&mut conn),
                )
                .await?;

            debug!(key = key, count = count, limit = limit, "Sliding window rejected request");
            return Ok(RateLimitInfo {
                allowed: false,
                limit: spec.limit,
                remaining: 0,
                reset_at,
                retry_after: Some(window_secs),
                window_secs: spec.window_secs(),
            });
        }

        Ok(RateLimitInfo {
            allowed: true,
            limit: spec.limit,
            remaining: u32::try_from(limit - count - 1).unwrap_or(u32::MAX),
            reset_at,
            retry_after: None,
            window_secs: spec.window_secs(),
        })
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut conn = self.store.connection();
        let _: i64 = self
            .store
            .run("DEL", redis::cmd("DEL").arg(key).query_async(&mut conn))
            .await?;
        Ok(())
    }

    fn mode(&self) -> ServiceMode {
        ServiceMode::Shared
    }

    fn backend_name(&self) -> &str {
        "sliding_window"
    }
}
