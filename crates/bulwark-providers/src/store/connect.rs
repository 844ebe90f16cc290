//! One-shot store probe
//!
//! Each degradable service calls [`connect`] once at construction and picks
//! its mode from the returned [`ConnectResult`]. Expected unavailability is a
//! value, not an error; only a malformed URL is an error.

use super::SharedStore;
use bulwark_domain::error::{Error, Result};
use bulwark_domain::value_objects::ServiceMode;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::debug;

/// Timeouts applied to the shared store
#[derive(Debug, Clone, Copy)]
pub struct StoreTimeouts {
    /// Bound on establishing the connection and the PING
    pub connect: Duration,
    /// Bound on every later command
    pub operation: Duration,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(2),
            operation: Duration::from_secs(1),
        }
    }
}

/// Outcome of probing the backing store
#[derive(Debug, Clone)]
pub enum ConnectResult {
    /// Store reachable; subsequent operations are delegated to it
    Connected(SharedStore),
    /// No store URL configured
    NotConfigured,
    /// Store configured but unreachable at startup
    Unavailable {
        /// Why the probe failed
        reason: String,
    },
}

impl ConnectResult {
    /// Whether the store is usable
    pub fn ok(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Why the store is not used, `None` when connected
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Connected(_) => None,
            Self::NotConfigured => Some("no backing store configured"),
            Self::Unavailable { reason } => Some(reason),
        }
    }

    /// The mode a service built from this result runs in
    pub fn mode(&self) -> ServiceMode {
        ServiceMode::from(self)
    }

    /// The store handle when connected
    pub fn store(&self) -> Option<&SharedStore> {
        match self {
            Self::Connected(store) => Some(store),
            _ => None,
        }
    }
}

impl From<&ConnectResult> for ServiceMode {
    fn from(result: &ConnectResult) -> Self {
        if result.ok() {
            ServiceMode::Shared
        } else {
            ServiceMode::Local
        }
    }
}

/// Probe the backing store once
///
/// # Returns
/// `Err` only for a malformed URL (configuration error). An absent URL or an
/// unreachable server is reported through [`ConnectResult`].
pub async fn connect(url: Option<&str>, timeouts: StoreTimeouts) -> Result<ConnectResult> {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(ConnectResult::NotConfigured);
    };
    let address = redact_url(url);
    let client = open_client(url)?;

    debug!(address = %address, "Probing backing store");

    let mut connection =
        match tokio::time::timeout(timeouts.connect, ConnectionManager::new(client)).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                return Ok(ConnectResult::Unavailable {
                    reason: format!("connection to {address} failed: {e}"),
                });
            }
            Err(_) => {
                return Ok(ConnectResult::Unavailable {
                    reason: format!(
                        "connection to {address} timed out after {}ms",
                        timeouts.connect.as_millis()
                    ),
                });
            }
        };

    match tokio::time::timeout(
        timeouts.connect,
        redis::cmd("PING").query_async::<String>(&mut connection),
    )
    .await
    {
        Ok(Ok(_)) => Ok(ConnectResult::Connected(SharedStore::new(
            connection,
            timeouts.operation,
            address,
        ))),
        Ok(Err(e)) => Ok(ConnectResult::Unavailable {
            reason: format!("PING to {address} failed: {e}"),
        }),
        Err(_) => Ok(ConnectResult::Unavailable {
            reason: format!("PING to {address} timed out"),
        }),
    }
}

/// Check that a store URL is well formed without connecting
pub fn validate_url(url: &str) -> Result<()> {
    open_client(url.trim()).map(|_| ())
}

fn open_client(url: &str) -> Result<redis::Client> {
    redis::Client::open(url).map_err(|e| {
        Error::configuration_with_source(
            format!("Invalid backing store URL '{}'", redact_url(url)),
            e,
        )
    })
}

/// Hide the credentials part of a store URL
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end + 3 => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
