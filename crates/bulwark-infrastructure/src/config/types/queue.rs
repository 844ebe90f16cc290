//! Task queue configuration types

use crate::constants::{JOB_RECORD_TTL_SECS, QUEUE_DRAIN_TIMEOUT_SECS, WORKER_POLL_INTERVAL_MS};
use bulwark_domain::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_JOB_KEY_PREFIX, DEFAULT_MAX_RETRIES, DEFAULT_WORKER_COUNT,
    WAIT_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Task queue configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QueueConfig {
    /// Size of the local worker pool
    #[validate(range(min = 1, max = 256))]
    pub workers: usize,

    /// Retries allowed when `enqueue` does not specify any
    pub default_max_retries: u32,

    /// Backoff base in milliseconds; the delay before retry `n` is `base * 2^n`
    pub backoff_base_ms: u64,

    /// Poll interval of `wait_for_job` in milliseconds
    #[validate(range(min = 1))]
    pub wait_poll_interval_ms: u64,

    /// Sleep of the external worker when the dispatch list is empty
    #[validate(range(min = 1))]
    pub worker_poll_interval_ms: u64,

    /// Lifetime of job records in the shared store
    #[validate(range(min = 1))]
    pub job_ttl_secs: u64,

    /// Key prefix of job records and the dispatch list
    #[validate(length(min = 1))]
    pub key_prefix: String,

    /// Time allowed for queued jobs to finish on shutdown
    pub drain_timeout_secs: u64,
}

impl QueueConfig {
    /// Backoff base as a duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// `wait_for_job` poll interval as a duration
    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms)
    }

    /// External worker poll interval as a duration
    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }

    /// Job record lifetime as a duration
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    /// Shutdown drain bound as a duration
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            default_max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            wait_poll_interval_ms: WAIT_POLL_INTERVAL_MS,
            worker_poll_interval_ms: WORKER_POLL_INTERVAL_MS,
            job_ttl_secs: JOB_RECORD_TTL_SECS,
            key_prefix: DEFAULT_JOB_KEY_PREFIX.to_string(),
            drain_timeout_secs: QUEUE_DRAIN_TIMEOUT_SECS,
        }
    }
}
