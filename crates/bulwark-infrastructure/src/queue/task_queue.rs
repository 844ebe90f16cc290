//! Task queue service
//!
//! Local mode records jobs in process and runs them on the [`WorkerPool`].
//! Shared mode writes the record and pushes its id onto the dispatch list for
//! a [`QueueWorker`] elsewhere; if that write fails the job runs locally.

use super::executor::JobExecutor;
use super::pool::WorkerPool;
use super::registry::JobRegistry;
use super::worker::QueueWorker;
use crate::config::{QueueConfig, StoreConfig};
use crate::utils::TimedOperation;
use bulwark_domain::error::{Error, Result};
use bulwark_domain::ports::{DispatchQueue, JobHandler, JobStore};
use bulwark_domain::value_objects::{
    EnqueueOptions, Job, JobArgs, JobDefinition, JobId, JobRunReport, ServiceMode,
};
use bulwark_providers::queue::{LocalJobStore, RedisJobStore};
use bulwark_providers::store::{ConnectResult, connect};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Named-job submission, execution and status tracking
#[derive(Debug)]
pub struct TaskQueue {
    registry: JobRegistry,
    mode: ServiceMode,
    local_store: LocalJobStore,
    shared: Option<Arc<RedisJobStore>>,
    pool: WorkerPool,
    config: QueueConfig,
}

impl TaskQueue {
    /// Probe the store and start the queue
    ///
    /// Must be called inside a tokio runtime; the local pool starts
    /// immediately in both modes.
    pub async fn new(config: &QueueConfig, store: &StoreConfig) -> Result<Self> {
        let probe = connect(store.url(), store.timeouts()).await?;
        Ok(Self::from_probe(&probe, config))
    }

    /// Start the queue for an existing probe result
    pub fn from_probe(probe: &ConnectResult, config: &QueueConfig) -> Self {
        let registry = JobRegistry::new();
        let local_store = LocalJobStore::new();
        let shared = probe.store().map(|store| {
            Arc::new(RedisJobStore::new(
                store.clone(),
                config.key_prefix.clone(),
                config.job_ttl(),
            ))
        });

        let executor = JobExecutor::new(
            registry.clone(),
            Arc::new(local_store.clone()),
            config.backoff_base(),
        );
        let pool = WorkerPool::start(config.workers, executor);
        let mode = probe.mode();

        info!(
            mode = %mode,
            workers = config.workers,
            reason = probe.reason().unwrap_or("connected"),
            "Task queue initialized"
        );

        Self {
            registry,
            mode,
            local_store,
            shared,
            pool,
            config: config.clone(),
        }
    }

    /// Register the handler of a job
    ///
    /// # Errors
    /// [`Error::DuplicateJob`] if the name is already registered
    pub fn register_handler<H>(&self, definition: JobDefinition, handler: H) -> Result<()>
    where
        H: JobHandler + 'static,
    {
        let name = definition.name.clone();
        self.registry.register(definition, Arc::new(handler))?;
        debug!(job = %name, "Job handler registered");
        Ok(())
    }

    /// Submit a job and return its id immediately
    ///
    /// # Errors
    /// [`Error::UnknownJob`] if no handler is registered under `name`
    pub async fn enqueue(&self, name: &str, options: EnqueueOptions, args: JobArgs) -> Result<JobId> {
        let registered = self
            .registry
            .get(name)
            .ok_or_else(|| Error::unknown_job(name))?;

        let job = Job::new(
            registered.definition.name,
            args,
            options.priority,
            options
                .max_retries
                .unwrap_or(self.config.default_max_retries),
        );
        let id = job.id;

        if let Some(shared) = &self.shared {
            match shared.submit(&job).await {
                Ok(()) => {
                    debug!(job_id = %id, job = %job.name, priority = %job.priority, "Job dispatched to shared queue");
                    return Ok(id);
                }
                Err(e) => warn!(
                    job_id = %id,
                    job = %job.name,
                    error = %e,
                    "Shared enqueue failed, running job locally"
                ),
            }
        }

        if !self.pool.is_accepting() {
            return Err(Error::internal("Task queue is shut down"));
        }
        self.local_store.save(&job).await?;
        debug!(job_id = %id, job = %job.name, priority = %job.priority, "Job submitted to worker pool");
        self.pool.submit(job)?;
        Ok(id)
    }

    /// Current record of a job
    ///
    /// `None` when the id is unknown or the shared store cannot be read.
    pub async fn get_status(&self, id: &JobId) -> Option<Job> {
        if let Ok(Some(job)) = self.local_store.load(id).await {
            return Some(job);
        }
        let shared = self.shared.as_ref()?;
        match shared.load(id).await {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %id, error = %e, "Job status read failed");
                None
            }
        }
    }

    /// Jobs accepted but not yet picked up, oldest first
    pub async fn get_pending_jobs(&self) -> Vec<Job> {
        let mut pending = self.local_store.pending().await.unwrap_or_default();
        if let Some(shared) = &self.shared {
            match shared.pending().await {
                Ok(jobs) => pending.extend(jobs),
                Err(e) => warn!(error = %e, "Pending job listing failed for shared queue"),
            }
        }
        pending.sort_by_key(|job| job.created_at);
        pending
    }

    /// Poll until the job reaches a terminal state
    ///
    /// Returns `None` on timeout; the job itself keeps running.
    pub async fn wait_for_job(&self, id: &JobId, timeout: Duration) -> Option<Job> {
        let timer = TimedOperation::start();
        let poll = self.config.wait_poll_interval();
        loop {
            if let Some(job) = self.get_status(id).await {
                if job.is_terminal() {
                    return Some(job);
                }
            }
            let remaining = timer.remaining(timeout)?;
            if remaining.is_zero() {
                return None;
            }
            tokio::time::sleep(poll.min(remaining)).await;
        }
    }

    /// Run a registered, enabled job once and report the outcome
    ///
    /// # Errors
    /// [`Error::UnknownJob`] or [`Error::JobDisabled`]
    pub async fn run_job(&self, name: &str) -> Result<JobRunReport> {
        self.run_job_with(name, JobArgs::new()).await
    }

    /// Like [`run_job`](Self::run_job) with explicit arguments
    pub async fn run_job_with(&self, name: &str, args: JobArgs) -> Result<JobRunReport> {
        let registered = self
            .registry
            .get(name)
            .ok_or_else(|| Error::unknown_job(name))?;
        if !registered.definition.enabled {
            return Err(Error::JobDisabled {
                name: name.to_string(),
            });
        }
        Ok(JobExecutor::run_once(&registered, args).await)
    }

    /// Every registered job, sorted by name
    pub fn list_jobs(&self) -> Vec<JobDefinition> {
        self.registry.definitions()
    }

    /// Where job records are dispatched
    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    /// The handler registry
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// A worker draining the shared dispatch list with this queue's handlers
    ///
    /// `None` in local mode.
    pub fn shared_worker(&self) -> Option<QueueWorker> {
        let shared = self.shared.as_ref()?;
        let dispatch: Arc<dyn DispatchQueue> = shared.clone();
        let store: Arc<dyn JobStore> = shared.clone();
        Some(QueueWorker::new(
            self.registry.clone(),
            dispatch,
            store,
            &self.config,
        ))
    }

    /// Stop accepting local jobs and drain the pool
    ///
    /// # Returns
    /// True if queued jobs finished within the drain timeout
    pub async fn shutdown(&self) -> bool {
        let drained = self.pool.shutdown(self.config.drain_timeout()).await;
        info!(drained = drained, "Task queue shut down");
        drained
    }
}
