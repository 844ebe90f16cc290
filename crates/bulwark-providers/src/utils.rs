//! Time helpers shared by backends

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole seconds since the Unix epoch
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current wall-clock time as fractional seconds since the Unix epoch
pub fn now_unix_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
