//! Backing store configuration types

use crate::constants::{STORE_CONNECT_TIMEOUT_MS, STORE_OPERATION_TIMEOUT_MS};
use bulwark_providers::store::StoreTimeouts;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Shared backing store configuration
///
/// An absent `url` is not an error; every service then runs locally.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis-compatible URL (e.g. `redis://localhost:6379/0`)
    pub url: Option<String>,

    /// Connect and PING timeout in milliseconds
    #[validate(range(min = 1))]
    pub connect_timeout_ms: u64,

    /// Per-command timeout in milliseconds
    #[validate(range(min = 1))]
    pub operation_timeout_ms: u64,
}

impl StoreConfig {
    /// Configuration pointing at `url`
    pub fn with_url<S: Into<String>>(url: S) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// The configured URL, blank values treated as absent
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Timeouts handed to the store probe
    pub fn timeouts(&self) -> StoreTimeouts {
        StoreTimeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            operation: Duration::from_millis(self.operation_timeout_ms),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_ms: STORE_CONNECT_TIMEOUT_MS,
            operation_timeout_ms: STORE_OPERATION_TIMEOUT_MS,
        }
    }
}
