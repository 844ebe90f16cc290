//! Cache value objects

use super::mode::ServiceMode;
use serde::Serialize;
use std::time::{Duration, Instant};

/// A value held by the local cache
///
/// Liveness is evaluated lazily: nothing removes an entry when its TTL runs
/// out, the next read (or the periodic sweep) does.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: serde_json::Value,
    /// When the entry was written
    pub created_at: Instant,
    /// Time to live, `None` never expires
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    /// Create an entry written now
    pub fn new(value: serde_json::Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Whether the entry's TTL has elapsed
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Whether the entry's TTL has elapsed at `now`
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) > ttl,
            None => false,
        }
    }
}

/// Cache operation statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of reads that returned a value
    pub hits: u64,
    /// Number of reads that returned nothing
    pub misses: u64,
    /// Number of successful writes
    pub sets: u64,
    /// Number of successful deletes
    pub deletes: u64,
    /// `hits / (hits + misses)`, 0.0 before the first read
    pub hit_rate: f64,
    /// Operating mode of the cache
    pub mode: ServiceMode,
}

impl CacheStats {
    /// Build stats from raw counters
    pub fn from_counters(hits: u64, misses: u64, sets: u64, deletes: u64, mode: ServiceMode) -> Self {
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        Self {
            hits,
            misses,
            sets,
            deletes,
            hit_rate,
            mode,
        }
    }
}
