//! Infrastructure layer constants
//!
//! Configuration discovery and service defaults. Keyspace layout and policy
//! defaults shared with the backends live in `bulwark_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "bulwark.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "bulwark";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "BULWARK";

/// Separator between nested keys in environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

/// Conventional variable holding the backing store URL
pub const REDIS_URL_ENV_VAR: &str = "REDIS_URL";

// ============================================================================
// BACKING STORE CONSTANTS
// ============================================================================

/// Bound on connecting to the store at startup
pub const STORE_CONNECT_TIMEOUT_MS: u64 = 2_000;

/// Bound on each store command
pub const STORE_OPERATION_TIMEOUT_MS: u64 = 1_000;

// ============================================================================
// RATE LIMIT CONSTANTS
// ============================================================================

/// Local bucket table size that triggers pruning
pub const RATE_LIMIT_MAX_LOCAL_BUCKETS: usize = 10_000;

// ============================================================================
// TASK QUEUE CONSTANTS
// ============================================================================

/// Sleep of the external worker when the dispatch list is empty
pub const WORKER_POLL_INTERVAL_MS: u64 = 500;

/// Lifetime of job records in the shared store (1 day)
pub const JOB_RECORD_TTL_SECS: u64 = 86_400;

/// Time allowed for the local pool to finish queued jobs on shutdown
pub const QUEUE_DRAIN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "BULWARK_LOG";

/// File name prefix of rolled log files
pub const LOG_FILE_PREFIX: &str = "bulwark";
