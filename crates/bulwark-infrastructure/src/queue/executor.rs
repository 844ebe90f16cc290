//! Job execution state machine
//!
//! One attempt is `pending|retrying -> running -> completed|retrying|failed`.
//! After a failed attempt with retries left the executor sleeps
//! `backoff_base * 2^retries` (retries counted before the increment) and runs
//! the handler again. Every transition is persisted to the job store.

use super::registry::{JobRegistry, RegisteredJob};
use crate::utils::TimedOperation;
use bulwark_domain::ports::{JobHandler, JobStore};
use bulwark_domain::value_objects::{Job, JobArgs, JobRunReport};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Runs jobs through the registry and records every transition
#[derive(Debug, Clone)]
pub struct JobExecutor {
    registry: JobRegistry,
    store: Arc<dyn JobStore>,
    backoff_base: Duration,
}

impl JobExecutor {
    /// Create an executor persisting to `store`
    pub fn new(registry: JobRegistry, store: Arc<dyn JobStore>, backoff_base: Duration) -> Self {
        Self {
            registry,
            store,
            backoff_base,
        }
    }

    /// Delay before the attempt following `retries` earlier retries
    pub fn backoff_delay(&self, retries: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(retries))
    }

    /// Execute a job until it reaches a terminal state
    ///
    /// Handler errors and panics drive the retry state machine; nothing here
    /// returns an error to the caller.
    pub async fn execute(&self, mut job: Job) -> Job {
        let Some(registered) = self.registry.get(job.name.as_str()) else {
            let message = format!("No handler registered for job '{}'", job.name);
            error!(job_id = %job.id, job = %job.name, "{message}");
            if job.start().is_ok() && job.fail(message).is_ok() {
                self.persist(&job).await;
            }
            return job;
        };

        loop {
            if let Err(e) = job.start() {
                error!(job_id = %job.id, job = %job.name, error = %e, "Job cannot start");
                return job;
            }
            self.persist(&job).await;
            debug!(job_id = %job.id, job = %job.name, attempt = job.retries + 1, "Job attempt started");

            match invoke(&registered.handler, job.args.clone()).await {
                Ok(value) => {
                    if let Err(e) = job.complete(value) {
                        error!(job_id = %job.id, job = %job.name, error = %e, "Job completion rejected");
                        return job;
                    }
                    self.persist(&job).await;
                    info!(job_id = %job.id, job = %job.name, retries = job.retries, "Job completed");
                    return job;
                }
                Err(message) if job.can_retry() => {
                    let delay = self.backoff_delay(job.retries);
                    if let Err(e) = job.retry(message) {
                        error!(job_id = %job.id, job = %job.name, error = %e, "Job retry rejected");
                        return job;
                    }
                    self.persist(&job).await;
                    warn!(
                        job_id = %job.id,
                        job = %job.name,
                        retries = job.retries,
                        max_retries = job.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = job.error.as_deref().unwrap_or_default(),
                        "Job failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(message) => {
                    if let Err(e) = job.fail(message) {
                        error!(job_id = %job.id, job = %job.name, error = %e, "Job failure rejected");
                        return job;
                    }
                    self.persist(&job).await;
                    error!(
                        job_id = %job.id,
                        job = %job.name,
                        retries = job.retries,
                        error = job.error.as_deref().unwrap_or_default(),
                        "Job failed permanently"
                    );
                    return job;
                }
            }
        }
    }

    /// Run a registered job once, without retries or persistence
    pub async fn run_once(registered: &RegisteredJob, args: JobArgs) -> JobRunReport {
        let timer = TimedOperation::start();
        let outcome = invoke(&registered.handler, args).await;
        let duration_ms = timer.elapsed_ms();
        let name = registered.definition.name.clone();

        match outcome {
            Ok(result) => {
                info!(job = %name, duration_ms = duration_ms, "Job run succeeded");
                JobRunReport {
                    name,
                    success: true,
                    result: Some(result),
                    error: None,
                    duration_ms,
                }
            }
            Err(message) => {
                warn!(job = %name, duration_ms = duration_ms, error = %message, "Job run failed");
                JobRunReport {
                    name,
                    success: false,
                    result: None,
                    error: Some(message),
                    duration_ms,
                }
            }
        }
    }

    async fn persist(&self, job: &Job) {
        if let Err(e) = self.store.save(job).await {
            warn!(
                job_id = %job.id,
                status = %job.status,
                store = self.store.backend_name(),
                error = %e,
                "Failed to persist job record"
            );
        }
    }
}

/// Run the handler on its own task so a panic is reported as a failure
async fn invoke(handler: &Arc<dyn JobHandler>, args: JobArgs) -> Result<serde_json::Value, String> {
    let handler = Arc::clone(handler);
    match tokio::spawn(async move { handler.run(args).await }).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) if e.is_panic() => Err(format!("handler panicked: {}", panic_message(e.into_panic()))),
        Err(e) => Err(format!("handler task aborted: {e}")),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
