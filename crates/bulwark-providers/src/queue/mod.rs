//! Job Store and Dispatch Implementations
//!
//! | Type | Mode | Implements |
//! |------|------|------------|
//! | [`LocalJobStore`] | Local | `JobStore` |
//! | [`MemoryDispatchQueue`] | Local | `DispatchQueue` (and `JobStore` via its record store) |
//! | [`RedisJobStore`] | Shared | `JobStore`, `DispatchQueue` |

pub mod local;
pub mod redis;

pub use local::{LocalJobStore, MemoryDispatchQueue};
pub use redis::RedisJobStore;
