//! Job entity and related value objects
//!
//! A [`Job`] moves along `pending -> running -> {completed | failed | retrying}`
//! and `retrying -> running`, the latter at most `max_retries` times. Only the
//! worker executing a job mutates it.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Keyword arguments passed to a job handler
pub type JobArgs = serde_json::Map<String, serde_json::Value>;

/// Unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::invalid_argument(format!("Invalid job id '{s}': {e}")))
    }
}

/// Name under which a job handler is registered
///
/// Restricted to ASCII letters, digits and `_ - . :` so it can be used
/// verbatim in log fields and store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    /// Maximum accepted name length
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap a job name
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > Self::MAX_LEN {
            return Err(Error::invalid_argument(format!(
                "Job name must be 1..={} characters, got {}",
                Self::MAX_LEN,
                name.len()
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
        {
            return Err(Error::invalid_argument(format!(
                "Job name '{name}' contains invalid character '{bad}'"
            )));
        }
        Ok(Self(name))
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JobName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<JobName> for String {
    fn from(name: JobName) -> Self {
        name.0
    }
}

/// Job priority
///
/// Recorded on the job for observability; dispatch order is FIFO regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    /// Background work
    Low,
    /// Regular work
    #[default]
    Normal,
    /// Work that should run soon
    High,
    /// Work that should run first
    Critical,
}

impl FromStr for JobPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::invalid_argument(format!(
                "Unknown job priority '{other}'. Use low, normal, high or critical"
            ))),
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet picked up
    Pending,
    /// A worker is executing the handler
    Running,
    /// Handler returned a result
    Completed,
    /// Handler failed and no retries remain
    Failed,
    /// Handler failed, waiting for the backoff before the next attempt
    Retrying,
}

impl JobStatus {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Retrying, Self::Running)
                | (Self::Running, Self::Completed | Self::Failed | Self::Retrying)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        })
    }
}

/// A unit of asynchronous work and its execution record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job id
    pub id: JobId,
    /// Registered handler name
    pub name: JobName,
    /// Handler arguments
    pub args: JobArgs,
    /// Recorded priority
    pub priority: JobPriority,
    /// Current state
    pub status: JobStatus,
    /// When the job was enqueued
    pub created_at: DateTime<Utc>,
    /// When the latest attempt started
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
    /// Handler result on success
    pub result: Option<serde_json::Value>,
    /// Latest handler error message
    pub error: Option<String>,
    /// Retries performed so far
    pub retries: u32,
    /// Retries allowed after the first attempt
    pub max_retries: u32,
}

impl Job {
    /// Create a pending job
    pub fn new(name: JobName, args: JobArgs, priority: JobPriority, max_retries: u32) -> Self {
        Self {
            id: JobId::new(),
            name,
            args,
            priority,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            retries: 0,
            max_retries,
        }
    }

    /// Whether the job reached `completed` or `failed`
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether another attempt is allowed after a failure
    pub fn can_retry(&self) -> bool {
        self.retries < self.max_retries
    }

    /// Begin an attempt
    pub fn start(&mut self) -> Result<()> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record a successful attempt
    pub fn complete(&mut self, result: serde_json::Value) -> Result<()> {
        self.transition(JobStatus::Completed)?;
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Record a failed attempt that will be retried
    pub fn retry(&mut self, error: String) -> Result<()> {
        if !self.can_retry() {
            return Err(Error::internal(format!(
                "Job {} exhausted its {} retries",
                self.id, self.max_retries
            )));
        }
        self.transition(JobStatus::Retrying)?;
        self.retries += 1;
        self.error = Some(error);
        Ok(())
    }

    /// Record the final failed attempt
    pub fn fail(&mut self, error: String) -> Result<()> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::internal(format!(
                "Illegal job transition {} -> {} for job {}",
                self.status, next, self.id
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// Options accepted by `enqueue`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnqueueOptions {
    /// Recorded priority
    pub priority: JobPriority,
    /// Retries allowed, `None` uses the queue default
    pub max_retries: Option<u32>,
}

impl EnqueueOptions {
    /// Set the priority
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Static description of a registered job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Registered name
    pub name: JobName,
    /// What the job does
    pub description: String,
    /// Schedule expression used by the external scheduler
    pub schedule: Option<String>,
    /// Whether the scheduler may trigger it
    pub enabled: bool,
}

impl JobDefinition {
    /// Define an enabled, unscheduled job
    pub fn new<S: Into<String>>(name: JobName, description: S) -> Self {
        Self {
            name,
            description: description.into(),
            schedule: None,
            enabled: true,
        }
    }

    /// Attach a schedule expression
    pub fn with_schedule<S: Into<String>>(mut self, schedule: S) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    /// Enable or disable the job
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Result of a synchronous `run_job`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRunReport {
    /// Job that ran
    pub name: JobName,
    /// Whether the handler returned a result
    pub success: bool,
    /// Handler result on success
    pub result: Option<serde_json::Value>,
    /// Handler error message on failure
    pub error: Option<String>,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
}
