//! Local worker pool
//!
//! A fixed number of tokio tasks pull jobs from one unbounded channel. Each
//! worker runs a single job at a time and a job is sent to the channel once,
//! so no job executes on two workers.

use super::executor::JobExecutor;
use bulwark_domain::error::{Error, Result};
use bulwark_domain::value_objects::Job;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fixed-size pool of job workers
#[derive(Debug)]
pub struct WorkerPool {
    sender: Mutex<Option<UnboundedSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl WorkerPool {
    /// Spawn `size` workers executing through `executor`
    pub fn start(size: usize, executor: JobExecutor) -> Self {
        let size = size.max(1);
        let (sender, receiver) = unbounded_channel::<Job>();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..size)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let executor = executor.clone();
                tokio::spawn(async move { run_worker(worker, receiver, executor).await })
            })
            .collect();

        info!(workers = size, "Worker pool started");
        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        }
    }

    /// Number of workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Hand a job to the next free worker
    ///
    /// # Errors
    /// Internal error once the pool has been shut down
    pub fn submit(&self, job: Job) -> Result<()> {
        let guard = lock(&self.sender);
        let Some(sender) = guard.as_ref() else {
            return Err(Error::internal("Worker pool is shut down"));
        };
        sender
            .send(job)
            .map_err(|e| Error::internal(format!("Worker pool closed, job {} dropped", e.0.id)))
    }

    /// Whether the pool still accepts jobs
    pub fn is_accepting(&self) -> bool {
        lock(&self.sender).is_some()
    }

    /// Stop accepting jobs and wait for queued ones to finish
    ///
    /// Workers still busy when `timeout` runs out are aborted.
    ///
    /// # Returns
    /// True if every worker exited within the timeout
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        drop(lock(&self.sender).take());
        let workers: Vec<JoinHandle<()>> = lock(&self.workers).drain(..).collect();
        if workers.is_empty() {
            return true;
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut drained = true;
        for mut worker in workers {
            if tokio::time::timeout_at(deadline, &mut worker).await.is_err() {
                worker.abort();
                drained = false;
            }
        }

        if drained {
            info!(workers = self.size, "Worker pool drained");
        } else {
            warn!(
                workers = self.size,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "Worker pool drain timed out, remaining jobs aborted"
            );
        }
        drained
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<UnboundedReceiver<Job>>>,
    executor: JobExecutor,
) {
    debug!(worker = worker, "Worker started");
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        executor.execute(job).await;
    }
    debug!(worker = worker, "Worker stopped");
}
