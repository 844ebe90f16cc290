//! Service operating mode

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a degradable service keeps its state
///
/// Selected once at construction from the store probe and never changed
/// for the lifetime of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// State lives in the shared backing store
    Shared,
    /// State lives in an in-process structure
    Local,
}

impl ServiceMode {
    /// Mode name as reported in stats and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Local => "local",
        }
    }

    /// Whether the service delegates to the shared store
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
