//! In-process job records and dispatch list

use async_trait::async_trait;
use bulwark_domain::error::Result;
use bulwark_domain::ports::{DispatchQueue, JobStore};
use bulwark_domain::value_objects::{Job, JobId, JobStatus};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// DashMap-backed job records
#[derive(Debug, Clone, Default)]
pub struct LocalJobStore {
    jobs: Arc<DashMap<JobId, Job>>,
}

impl LocalJobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no record is held
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether a record exists for `id`
    pub fn contains(&self, id: &JobId) -> bool {
        self.jobs.contains_key(id)
    }
}

#[async_trait]
impl JobStore for LocalJobStore {
    async fn save(&self, job: &Job) -> Result<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn load(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.get(id).map(|job| job.clone()))
    }

    async fn pending(&self) -> Result<Vec<Job>> {
        let mut pending: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| entry.status == JobStatus::Pending)
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by_key(|job| job.created_at);
        Ok(pending)
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}

/// FIFO dispatch list over a [`LocalJobStore`]
///
/// Lets the external worker runtime run against in-process state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDispatchQueue {
    records: LocalJobStore,
    queue: Arc<Mutex<VecDeque<JobId>>>,
}

impl MemoryDispatchQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// The record store behind the queue
    pub fn records(&self) -> &LocalJobStore {
        &self.records
    }

    fn with_queue<T>(&self, f: impl FnOnce(&mut VecDeque<JobId>) -> T) -> T {
        let mut queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut queue)
    }
}

#[async_trait]
impl DispatchQueue for MemoryDispatchQueue {
    async fn submit(&self, job: &Job) -> Result<()> {
        self.records.save(job).await?;
        self.with_queue(|queue| queue.push_back(job.id));
        Ok(())
    }

    async fn pop(&self) -> Result<Option<JobId>> {
        Ok(self.with_queue(VecDeque::pop_front))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.with_queue(|queue| queue.len()))
    }
}

#[async_trait]
impl JobStore for MemoryDispatchQueue {
    async fn save(&self, job: &Job) -> Result<()> {
        self.records.save(job).await
    }

    async fn load(&self, id: &JobId) -> Result<Option<Job>> {
        self.records.load(id).await
    }

    async fn pending(&self) -> Result<Vec<Job>> {
        self.records.pending().await
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
