//! Redis job records and dispatch list
//!
//! Records are JSON under `{prefix}:{job_id}` with a TTL; the dispatch list
//! `{prefix}:dispatch` holds job ids in submission order. Submission writes
//! both inside one `MULTI/EXEC`.

use crate::store::SharedStore;
use async_trait::async_trait;
use bulwark_domain::constants::KEY_SEPARATOR;
use bulwark_domain::error::Result;
use bulwark_domain::ports::{DispatchQueue, JobStore};
use bulwark_domain::value_objects::{Job, JobId, JobStatus};
use std::time::Duration;
use tracing::warn;

/// Redis-backed job store and dispatch list
#[derive(Debug, Clone)]
pub struct RedisJobStore {
    store: SharedStore,
    prefix: String,
    record_ttl: Duration,
}

impl RedisJobStore {
    /// Create a store using `prefix` for every key
    pub fn new(store: SharedStore, prefix: impl Into<String>, record_ttl: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            record_ttl,
        }
    }

    /// Key of a job record
    pub fn record_key(&self, id: &JobId) -> String {
        format!("{}{KEY_SEPARATOR}{id}", self.prefix)
    }

    /// Key of the dispatch list
    pub fn dispatch_key(&self) -> String {
        format!("{}{KEY_SEPARATOR}dispatch", self.prefix)
    }

    fn ttl_secs(&self) -> u64 {
        self.record_ttl.as_secs().max(1)
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn save(&self, job: &Job) -> Result<()> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.store.connection();
        self.store
            .run(
                "SET",
                redis::cmd("SET")
                    .arg(self.record_key(&job.id))
                    .arg(payload)
                    .arg("EX")
                    .arg(self.ttl_secs())
                    .query_async::<()>(&mut conn),
            )
            .await
    }

    async fn load(&self, id: &JobId) -> Result<Option<Job>> {
        let mut conn = self.store.connection();
        let raw: Option<String> = self
            .store
            .run(
                "GET",
                redis::cmd("GET").arg(self.record_key(id)).query_async(&mut conn),
            )
            .await?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn pending(&self) -> Result<Vec<Job>> {
        let mut conn = self.store.connection();
        let ids: Vec<String> = self
            .store
            .run(
                "LRANGE",
                redis::cmd("LRANGE")
                    .arg(self.dispatch_key())
                    .arg(0)
                    .arg(-1)
                    .query_async(&mut conn),
            )
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| format!("{}{KEY_SEPARATOR}{id}", self.prefix))
            .collect();
        let raw: Vec<Option<String>> = self
            .store
            .run("MGET", redis::cmd("MGET").arg(&keys).query_async(&mut conn))
            .await?;

        let mut pending = Vec::with_capacity(raw.len());
        for text in raw.into_iter().flatten() {
            match serde_json::from_str::<Job>(&text) {
                Ok(job) if job.status == JobStatus::Pending => pending.push(job),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping undecodable job record"),
            }
        }
        Ok(pending)
    }

    fn backend_name(&self) -> &str {
        "redis"
    }
}

#[async_trait]
impl DispatchQueue for RedisJobStore {
    async fn submit(&self, job: &Job) -> Result<()> {
        let payload = serde_json::to_string(job)?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(self.record_key(&job.id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs())
            .ignore()
            .cmd("RPUSH")
            .arg(self.dispatch_key())
            .arg(job.id.to_string())
            .ignore();

        let mut conn = self.store.connection();
        self.store
            .run("MULTI/RPUSH", pipe.query_async::<()>(&mut conn))
            .await
    }

    async fn pop(&self) -> Result<Option<JobId>> {
        let mut conn = self.store.connection();
        let raw: Option<String> = self
            .store
            .run(
                "LPOP",
                redis::cmd("LPOP").arg(self.dispatch_key()).query_async(&mut conn),
            )
            .await?;

        match raw {
            Some(text) => Ok(Some(text.parse()?)),
            None => Ok(None),
        }
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.store.connection();
        self.store
            .run(
                "LLEN",
                redis::cmd("LLEN").arg(self.dispatch_key()).query_async(&mut conn),
            )
            .await
    }
}
