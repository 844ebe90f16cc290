//! Rate limit configuration types

use crate::constants::RATE_LIMIT_MAX_LOCAL_BUCKETS;
use bulwark_domain::constants::DEFAULT_RATE_LIMITS;
use bulwark_domain::error::Result;
use bulwark_domain::value_objects::RateLimitSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use validator::Validate;

/// Rate limiter configuration
///
/// `limits` maps an endpoint class to a spec string such as `"30/minute"`.
/// Entries given in a file or the environment override the built-in table
/// class by class.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether requests are limited at all
    pub enabled: bool,

    /// Local bucket table size that triggers pruning
    #[validate(range(min = 1))]
    pub max_local_buckets: usize,

    /// Limits per endpoint class
    pub limits: BTreeMap<String, String>,
}

impl RateLimitConfig {
    /// Parse every configured limit
    ///
    /// The built-in classes are always present; configured entries replace
    /// them. Unparsable strings are configuration errors.
    pub fn parsed_limits(&self) -> Result<HashMap<String, RateLimitSpec>> {
        let mut limits: HashMap<String, RateLimitSpec> = DEFAULT_RATE_LIMITS
            .iter()
            .map(|(class, limit, window)| ((*class).to_string(), RateLimitSpec::new(*limit, *window)))
            .collect();

        for (class, spec) in &self.limits {
            limits.insert(class.clone(), RateLimitSpec::parse(spec)?);
        }
        Ok(limits)
    }
}

fn spec_string(limit: u32, window_secs: u64) -> String {
    match window_secs {
        1 => format!("{limit}/second"),
        3600 => format!("{limit}/hour"),
        86_400 => format!("{limit}/day"),
        _ => format!("{limit}/minute"),
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_local_buckets: RATE_LIMIT_MAX_LOCAL_BUCKETS,
            limits: DEFAULT_RATE_LIMITS
                .iter()
                .map(|(class, limit, window)| ((*class).to_string(), spec_string(*limit, *window)))
                .collect(),
        }
    }
}
