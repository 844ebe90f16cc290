//! Rate limiter service

use crate::config::{RateLimitConfig, StoreConfig};
use bulwark_domain::constants::DEFAULT_ENDPOINT_CLASS;
use bulwark_domain::error::Result;
use bulwark_domain::ports::RateLimitBackend;
use bulwark_domain::value_objects::{RateLimitInfo, RateLimitSpec, ServiceMode, rate_limit_key};
use bulwark_providers::store::{ConnectResult, connect};
use bulwark_providers::utils::now_unix_secs;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Admission control per (identifier, endpoint class)
///
/// A backend failure admits the request: the limiter must never take the
/// protected service down with it.
#[derive(Debug)]
pub struct RateLimiter {
    backend: Arc<dyn RateLimitBackend>,
    limits: HashMap<String, RateLimitSpec>,
    enabled: bool,
}

impl RateLimiter {
    /// Probe the store and build the limiter
    ///
    /// # Errors
    /// Malformed store URL or an unparsable limit string
    pub async fn new(config: &RateLimitConfig, store: &StoreConfig) -> Result<Self> {
        let limits = config.parsed_limits()?;
        let probe = connect(store.url(), store.timeouts()).await?;
        Ok(Self::build(&probe, config, limits))
    }

    /// Build the limiter for an existing probe result
    pub fn from_probe(probe: &ConnectResult, config: &RateLimitConfig) -> Result<Self> {
        let limits = config.parsed_limits()?;
        Ok(Self::build(probe, config, limits))
    }

    fn build(
        probe: &ConnectResult,
        config: &RateLimitConfig,
        limits: HashMap<String, RateLimitSpec>,
    ) -> Self {
        let backend = bulwark_providers::rate_limit::backend_for(probe, config.max_local_buckets);
        info!(
            mode = %backend.mode(),
            backend = backend.backend_name(),
            enabled = config.enabled,
            classes = limits.len(),
            reason = probe.reason().unwrap_or("connected"),
            "Rate limiter initialized"
        );
        Self {
            backend,
            limits,
            enabled: config.enabled,
        }
    }

    /// Build the limiter over an explicit backend
    pub fn with_backend(backend: Arc<dyn RateLimitBackend>, config: &RateLimitConfig) -> Result<Self> {
        Ok(Self {
            backend,
            limits: config.parsed_limits()?,
            enabled: config.enabled,
        })
    }

    /// Limit applied to an endpoint class
    ///
    /// Unknown classes use the `default` entry.
    pub fn spec_for(&self, endpoint_class: &str) -> RateLimitSpec {
        self.limits
            .get(endpoint_class)
            .or_else(|| self.limits.get(DEFAULT_ENDPOINT_CLASS))
            .copied()
            .unwrap_or_else(|| RateLimitSpec::new(100, 60))
    }

    /// Record a request and decide whether it is admitted
    pub async fn check(&self, identifier: &str, endpoint_class: &str) -> RateLimitInfo {
        self.check_with(identifier, endpoint_class, None).await
    }

    /// Like [`check`](Self::check) with an explicit limit overriding the table
    pub async fn check_with(
        &self,
        identifier: &str,
        endpoint_class: &str,
        custom: Option<RateLimitSpec>,
    ) -> RateLimitInfo {
        let spec = custom.unwrap_or_else(|| self.spec_for(endpoint_class));
        if !self.enabled {
            return RateLimitInfo::unlimited(&spec, now_unix_secs());
        }

        let key = rate_limit_key(identifier, endpoint_class);
        match self.backend.check(&key, &spec).await {
            Ok(info) => {
                if !info.allowed {
                    debug!(
                        identifier = identifier,
                        endpoint_class = endpoint_class,
                        limit = info.limit,
                        retry_after = info.retry_after,
                        "Rate limit exceeded"
                    );
                }
                info
            }
            Err(e) => {
                warn!(
                    identifier = identifier,
                    endpoint_class = endpoint_class,
                    error = %e,
                    "Rate limit check failed, admitting request"
                );
                RateLimitInfo::unlimited(&spec, now_unix_secs())
            }
        }
    }

    /// Forget the state of an (identifier, endpoint class) pair
    ///
    /// # Returns
    /// False if the backend failed
    pub async fn reset(&self, identifier: &str, endpoint_class: &str) -> bool {
        let key = rate_limit_key(identifier, endpoint_class);
        match self.backend.reset(&key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(identifier = identifier, endpoint_class = endpoint_class, error = %e, "Rate limit reset failed");
                false
            }
        }
    }

    /// Whether limiting is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Where counts are kept
    pub fn mode(&self) -> ServiceMode {
        self.backend.mode()
    }

    /// The resolved limits table
    pub fn limits(&self) -> &HashMap<String, RateLimitSpec> {
        &self.limits
    }
}
