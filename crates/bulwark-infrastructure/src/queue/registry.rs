//! Job handler registry

use bulwark_domain::error::{Error, Result};
use bulwark_domain::ports::JobHandler;
use bulwark_domain::value_objects::JobDefinition;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// A definition and the handler that runs it
#[derive(Clone)]
pub struct RegisteredJob {
    /// Static description of the job
    pub definition: JobDefinition,
    /// Executable body
    pub handler: Arc<dyn JobHandler>,
}

impl std::fmt::Debug for RegisteredJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredJob")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Handlers keyed by job name
///
/// Names are registered once; a second registration under the same name is
/// rejected instead of silently replacing the first handler.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<DashMap<String, RegisteredJob>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler
    ///
    /// # Errors
    /// [`Error::DuplicateJob`] if the name is taken
    pub fn register(&self, definition: JobDefinition, handler: Arc<dyn JobHandler>) -> Result<()> {
        match self.jobs.entry(definition.name.as_str().to_string()) {
            Entry::Occupied(entry) => Err(Error::DuplicateJob {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(RegisteredJob { definition, handler });
                Ok(())
            }
        }
    }

    /// Look up a job by name
    pub fn get(&self, name: &str) -> Option<RegisteredJob> {
        self.jobs.get(name).map(|job| job.value().clone())
    }

    /// Whether a job is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// All definitions sorted by name
    pub fn definitions(&self) -> Vec<JobDefinition> {
        let mut definitions: Vec<JobDefinition> = self
            .jobs
            .iter()
            .map(|job| job.definition.clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Number of registered jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
