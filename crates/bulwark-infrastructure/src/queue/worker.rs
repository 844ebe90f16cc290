//! External queue worker
//!
//! Runs in any process sharing the backing store and the handler registry.
//! It pops job ids off the dispatch list, loads each record and drives it
//! through the same [`JobExecutor`] the local pool uses.

use super::executor::JobExecutor;
use super::registry::JobRegistry;
use crate::config::QueueConfig;
use bulwark_domain::error::Result;
use bulwark_domain::ports::{DispatchQueue, JobStore};
use bulwark_domain::value_objects::JobStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Dispatch list consumer
#[derive(Debug, Clone)]
pub struct QueueWorker {
    dispatch: Arc<dyn DispatchQueue>,
    store: Arc<dyn JobStore>,
    executor: JobExecutor,
    poll_interval: Duration,
}

impl QueueWorker {
    /// Create a worker over a dispatch list and its record store
    pub fn new(
        registry: JobRegistry,
        dispatch: Arc<dyn DispatchQueue>,
        store: Arc<dyn JobStore>,
        config: &QueueConfig,
    ) -> Self {
        let executor = JobExecutor::new(registry, Arc::clone(&store), config.backoff_base());
        Self {
            dispatch,
            store,
            executor,
            poll_interval: config.worker_poll_interval(),
        }
    }

    /// Take one job off the dispatch list and run it
    ///
    /// # Returns
    /// False when the list was empty
    pub async fn process_next(&self) -> Result<bool> {
        let Some(id) = self.dispatch.pop().await? else {
            return Ok(false);
        };

        let Some(job) = self.store.load(&id).await? else {
            warn!(job_id = %id, "Dispatched job has no record, skipping");
            return Ok(true);
        };
        if job.status != JobStatus::Pending {
            debug!(job_id = %id, status = %job.status, "Dispatched job is not pending, skipping");
            return Ok(true);
        }

        self.executor.execute(job).await;
        Ok(true)
    }

    /// Process jobs until `token` is cancelled
    ///
    /// Sleeps for the poll interval whenever the list is empty or the store
    /// fails.
    ///
    /// # Returns
    /// Number of dispatched ids handled
    pub async fn run(&self, token: CancellationToken) -> usize {
        info!(poll_interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX), "Queue worker started");
        let mut handled = 0;
        while !token.is_cancelled() {
            let busy = match self.process_next().await {
                Ok(busy) => busy,
                Err(e) => {
                    warn!(error = %e, "Queue worker poll failed");
                    false
                }
            };
            if busy {
                handled += 1;
                continue;
            }
            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!(handled = handled, "Queue worker stopped");
        handled
    }
}
