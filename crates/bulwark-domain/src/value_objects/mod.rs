//! Value objects and entities
//!
//! Plain data shared by every backend. No I/O happens here.

pub mod cache;
pub mod job;
pub mod mode;
pub mod rate_limit;

pub use cache::{CacheEntry, CacheStats};
pub use job::{
    EnqueueOptions, Job, JobArgs, JobDefinition, JobId, JobName, JobPriority, JobRunReport,
    JobStatus,
};
pub use mode::ServiceMode;
pub use rate_limit::{
    BucketDecision, RateLimitInfo, RateLimitRejection, RateLimitSpec, TokenBucket, ceil_secs,
    rate_limit_key,
};
