//! Domain constants
//!
//! Keyspace layout and default policy values shared by every backend.

// ============================================================================
// KEYSPACE
// ============================================================================

/// Separator between key segments (`{namespace}:{key}`)
pub const KEY_SEPARATOR: &str = ":";

/// Default cache namespace (application identifier)
pub const DEFAULT_CACHE_NAMESPACE: &str = "bulwark";

/// Prefix of every rate limit key (`ratelimit:{identifier}:{endpoint_class}`)
pub const RATE_LIMIT_KEY_PREFIX: &str = "ratelimit";

/// Default prefix for job records and the dispatch list
pub const DEFAULT_JOB_KEY_PREFIX: &str = "jobs";

// ============================================================================
// CACHE
// ============================================================================

/// Default TTL applied when `set` is called without one (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Interval of the local expiry sweep
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 60;

// ============================================================================
// RATE LIMITING
// ============================================================================

/// Endpoint class used when the caller's class has no entry in the table
pub const DEFAULT_ENDPOINT_CLASS: &str = "default";

/// Built-in limits table as `(endpoint_class, limit, window_secs)`
pub const DEFAULT_RATE_LIMITS: &[(&str, u32, u64)] = &[
    ("default", 100, 60),
    ("auth", 5, 60),
    ("ai", 20, 60),
    ("search", 30, 60),
    ("upload", 10, 60),
    ("webhook", 1000, 60),
];

// ============================================================================
// TASK QUEUE
// ============================================================================

/// Default number of retries after the first failed attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default size of the local worker pool
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Base of the exponential backoff (`base * 2^retries`)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;

/// Poll interval of `wait_for_job`
pub const WAIT_POLL_INTERVAL_MS: u64 = 100;
