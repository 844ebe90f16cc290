//! Background task queue
//!
//! | Type | Role |
//! |------|------|
//! | [`TaskQueue`] | Public service: enqueue, status, wait, run_job |
//! | [`JobRegistry`] | Typed handler table keyed by job name |
//! | [`JobExecutor`] | The retry/backoff state machine for one job |
//! | [`WorkerPool`] | Fixed-size local pool fed by a channel |
//! | [`QueueWorker`] | External worker draining the shared dispatch list |

mod executor;
mod pool;
mod registry;
mod task_queue;
mod worker;

pub use executor::JobExecutor;
pub use pool::WorkerPool;
pub use registry::{JobRegistry, RegisteredJob};
pub use task_queue::TaskQueue;
pub use worker::QueueWorker;
