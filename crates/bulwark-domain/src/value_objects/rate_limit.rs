//! Rate limiting value objects
//!
//! [`RateLimitSpec`] is the configured budget, [`TokenBucket`] is the local
//! per-key record and [`RateLimitInfo`] is the answer handed back to callers,
//! convertible to the HTTP header contract.

use crate::constants::RATE_LIMIT_KEY_PREFIX;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// HTTP status returned with a rejection
pub const TOO_MANY_REQUESTS: u16 = 429;

/// A request budget: `limit` requests per `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSpec {
    /// Requests admitted per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitSpec {
    /// Create a spec from a count and a window in seconds
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Parse a human readable spec such as `10/minute` or `1000/day`
    ///
    /// Unknown units are configuration errors.
    pub fn parse(spec: &str) -> Result<Self> {
        let (count, unit) = spec.split_once('/').ok_or_else(|| {
            Error::configuration(format!(
                "Invalid rate limit '{spec}': expected '<count>/<unit>'"
            ))
        })?;

        let limit: u32 = count.trim().parse().map_err(|e| {
            Error::configuration_with_source(format!("Invalid rate limit count in '{spec}'"), e)
        })?;
        if limit == 0 {
            return Err(Error::configuration(format!(
                "Invalid rate limit '{spec}': count must be at least 1"
            )));
        }

        let window_secs = match unit.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => 1,
            "m" | "min" | "minute" | "minutes" => 60,
            "h" | "hour" | "hours" => 3600,
            "d" | "day" | "days" => 86_400,
            other => {
                return Err(Error::configuration(format!(
                    "Unknown rate limit unit '{other}' in '{spec}'. Use second, minute, hour or day"
                )));
            }
        };

        Ok(Self::new(limit, window_secs))
    }

    /// Window length in whole seconds
    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Tokens added per second by the local bucket
    pub fn refill_rate(&self) -> f64 {
        let window = self.window.as_secs_f64();
        if window > 0.0 {
            f64::from(self.limit) / window
        } else {
            f64::from(self.limit)
        }
    }
}

impl FromStr for RateLimitSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RateLimitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.limit, self.window.as_secs())
    }
}

/// Storage key for an (identifier, endpoint class) pair
pub fn rate_limit_key(identifier: &str, endpoint_class: &str) -> String {
    format!("{RATE_LIMIT_KEY_PREFIX}:{identifier}:{endpoint_class}")
}

/// Token bucket state for one key
///
/// Capacity and refill rate are not stored; they derive from the spec
/// passed at check time (`capacity = limit`, `rate = limit / window`).
#[derive(Debug, Clone, Copy)]
pub struct TokenBucket {
    /// Tokens currently available
    pub tokens: f64,
    /// Last time tokens were refilled
    pub last_update: Instant,
}

/// Outcome of one token bucket acquisition
#[derive(Debug, Clone, Copy)]
pub struct BucketDecision {
    /// Whether a token was consumed
    pub allowed: bool,
    /// Whole tokens left after the decision
    pub remaining: u32,
    /// Time until one token is available, set on rejection
    pub retry_after: Option<Duration>,
    /// Time until the bucket is back at capacity
    pub time_to_full: Duration,
}

impl TokenBucket {
    /// A bucket at capacity
    pub fn full(spec: &RateLimitSpec, now: Instant) -> Self {
        Self {
            tokens: f64::from(spec.limit),
            last_update: now,
        }
    }

    /// Add the tokens accrued since `last_update`, capped at capacity
    pub fn refill(&mut self, spec: &RateLimitSpec, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        let capacity = f64::from(spec.limit);
        self.tokens = (self.tokens + elapsed * spec.refill_rate()).min(capacity);
        self.last_update = now;
    }

    /// Refill, then consume one token if available
    pub fn try_acquire(&mut self, spec: &RateLimitSpec, now: Instant) -> BucketDecision {
        self.refill(spec, now);
        let rate = spec.refill_rate();

        let allowed = self.tokens >= 1.0;
        let retry_after = if allowed {
            self.tokens -= 1.0;
            None
        } else if rate > 0.0 {
            Some(Duration::from_secs_f64((1.0 - self.tokens) / rate))
        } else {
            Some(spec.window)
        };

        let missing = (f64::from(spec.limit) - self.tokens).max(0.0);
        let time_to_full = if rate > 0.0 {
            Duration::from_secs_f64(missing / rate)
        } else {
            Duration::ZERO
        };

        BucketDecision {
            allowed,
            remaining: self.tokens.floor().max(0.0) as u32,
            retry_after,
            time_to_full,
        }
    }

    /// Whether the bucket would be at capacity at `now`
    pub fn is_full_at(&self, spec: &RateLimitSpec, now: Instant) -> bool {
        let mut probe = *self;
        probe.refill(spec, now);
        probe.tokens >= f64::from(spec.limit)
    }
}

/// Admission decision plus the data behind the rate limit headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the budget resets (epoch seconds)
    pub reset_at: u64,
    /// Seconds to wait before retrying, set on rejection
    pub retry_after: Option<u64>,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitInfo {
    /// Admit with a full budget (used when limiting is off or the store failed)
    pub fn unlimited(spec: &RateLimitSpec, now_epoch: u64) -> Self {
        Self {
            allowed: true,
            limit: spec.limit,
            remaining: spec.limit,
            reset_at: now_epoch + spec.window_secs(),
            retry_after: None,
            window_secs: spec.window_secs(),
        }
    }

    /// Response headers for this decision
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at.to_string()),
        ];
        if !self.allowed {
            if let Some(retry_after) = self.retry_after {
                headers.push(("Retry-After", retry_after.to_string()));
            }
        }
        headers
    }

    /// The 429 body for a rejected request, `None` when admitted
    pub fn rejection(&self) -> Option<RateLimitRejection> {
        if self.allowed {
            return None;
        }
        Some(RateLimitRejection {
            error: "Rate limit exceeded".to_string(),
            retry_after: self.retry_after.unwrap_or(self.window_secs),
            limit: self.limit,
            window: self.window_secs,
        })
    }
}

/// Structured body returned with HTTP 429
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRejection {
    /// Human readable error
    pub error: String,
    /// Seconds until a retry may succeed
    pub retry_after: u64,
    /// Requests allowed per window
    pub limit: u32,
    /// Window length in seconds
    pub window: u64,
}

impl RateLimitRejection {
    /// HTTP status code for the rejection
    pub fn status(&self) -> u16 {
        TOO_MANY_REQUESTS
    }
}

/// Round a wait up to whole seconds, never below one
pub fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs_f64().ceil() as u64;
    secs.max(1)
}
