//! Job Ports
//!
//! [`JobHandler`] is implemented by application code; [`JobStore`] and
//! [`DispatchQueue`] are implemented by the providers.

use crate::error::{HandlerError, Result};
use crate::value_objects::{Job, JobArgs, JobId};
use async_trait::async_trait;
use std::future::Future;

/// Executable body of a registered job
///
/// Async closures taking [`JobArgs`] implement this trait directly:
///
/// ```ignore
/// queue.register_handler(definition, |args: JobArgs| async move {
///     Ok::<_, HandlerError>(serde_json::json!(args.len()))
/// })?;
/// ```
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run the job once
    async fn run(&self, args: JobArgs) -> std::result::Result<serde_json::Value, HandlerError>;
}

#[async_trait]
impl<F, Fut> JobHandler for F
where
    F: Fn(JobArgs) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<serde_json::Value, HandlerError>> + Send + 'static,
{
    async fn run(&self, args: JobArgs) -> std::result::Result<serde_json::Value, HandlerError> {
        (self)(args).await
    }
}

/// Job record storage
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Insert or replace a job record
    async fn save(&self, job: &Job) -> Result<()>;

    /// Load a job record
    async fn load(&self, id: &JobId) -> Result<Option<Job>>;

    /// Jobs accepted but not yet picked up by a worker
    async fn pending(&self) -> Result<Vec<Job>>;

    /// Backend identifier (e.g. "local", "redis")
    fn backend_name(&self) -> &str;
}

/// Ordered hand-off of job ids to workers
#[async_trait]
pub trait DispatchQueue: Send + Sync + std::fmt::Debug {
    /// Persist the job record and append its id to the queue in one step
    async fn submit(&self, job: &Job) -> Result<()>;

    /// Take the oldest queued id, if any
    async fn pop(&self) -> Result<Option<JobId>>;

    /// Number of ids waiting
    async fn len(&self) -> Result<usize>;
}
