//! Shared backing store connection
//!
//! A [`SharedStore`] is a cheaply clonable handle over a Redis
//! `ConnectionManager`. Every command goes through [`SharedStore::run`], which
//! bounds it with the per-operation timeout and maps failures to
//! [`Error::Store`] so callers can apply their fail-open policy.

mod connect;

pub use connect::{ConnectResult, StoreTimeouts, connect, redact_url, validate_url};

use bulwark_domain::error::{Error, Result};
use redis::RedisError;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;

/// Handle to a reachable Redis-compatible server
#[derive(Clone)]
pub struct SharedStore {
    connection: ConnectionManager,
    operation_timeout: Duration,
    address: String,
}

impl SharedStore {
    pub(crate) fn new(connection: ConnectionManager, operation_timeout: Duration, address: String) -> Self {
        Self {
            connection,
            operation_timeout,
            address,
        }
    }

    /// A connection for issuing commands
    ///
    /// Clones share one multiplexed connection; blocking commands must not be
    /// sent through it.
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Server address with credentials redacted
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Per-operation timeout
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Await a Redis command under the operation timeout
    pub async fn run<T, F>(&self, op: &str, command: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(store_error(op, e)),
            Err(_) => Err(Error::store(format!(
                "Redis {op} timed out after {}ms",
                self.operation_timeout.as_millis()
            ))),
        }
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("address", &self.address)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// Convert a Redis error into a store error
pub(crate) fn store_error(op: &str, err: RedisError) -> Error {
    Error::store_with_source(format!("Redis {op} failed: {err}"), err)
}

/// TTL in milliseconds for `PX`, never below one
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}
