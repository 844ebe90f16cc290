//! Application context bootstrap
//!
//! Construction order: validate config, build the cache, rate limiter and
//! task queue (each probing the store independently), start the local cache
//! sweep. Teardown reverses it: signal shutdown, stop the sweep and flush
//! cache stats, drain the worker pool.

use crate::cache::CacheManager;
use crate::config::{AppConfig, validate_app_config};
use crate::infrastructure::ShutdownCoordinator;
use crate::queue::TaskQueue;
use crate::rate_limit::RateLimiter;
use crate::utils::TimedOperation;
use bulwark_domain::error::Result;
use bulwark_domain::value_objects::ServiceMode;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Operating mode of every service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceModes {
    /// Cache mode
    pub cache: ServiceMode,
    /// Rate limiter mode
    pub rate_limiter: ServiceMode,
    /// Task queue mode
    pub task_queue: ServiceMode,
}

/// The process-wide services and their lifecycle
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    cache: Arc<CacheManager>,
    rate_limiter: Arc<RateLimiter>,
    task_queue: Arc<TaskQueue>,
    shutdown: ShutdownCoordinator,
}

impl AppContext {
    /// Build every service from `config`
    ///
    /// # Errors
    /// Configuration errors only; an unreachable store selects local mode.
    pub async fn init(config: AppConfig) -> Result<Self> {
        let timer = TimedOperation::start();
        validate_app_config(&config)?;

        let cache = Arc::new(CacheManager::new(&config.cache, &config.store).await?);
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit, &config.store).await?);
        let task_queue = Arc::new(TaskQueue::new(&config.queue, &config.store).await?);

        let shutdown = ShutdownCoordinator::new();
        cache.start_sweep(config.cache.sweep_interval(), &shutdown.child_token());

        let context = Self {
            config: Arc::new(config),
            cache,
            rate_limiter,
            task_queue,
            shutdown,
        };

        let modes = context.modes();
        info!(
            cache = %modes.cache,
            rate_limiter = %modes.rate_limiter,
            task_queue = %modes.task_queue,
            elapsed_ms = timer.elapsed_ms(),
            "Application context initialized"
        );
        Ok(context)
    }

    /// Effective configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Cache service
    pub fn cache(&self) -> Arc<CacheManager> {
        Arc::clone(&self.cache)
    }

    /// Rate limiter service
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    /// Task queue service
    pub fn task_queue(&self) -> Arc<TaskQueue> {
        Arc::clone(&self.task_queue)
    }

    /// Shutdown signal shared by background tasks
    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Mode of every service
    pub fn modes(&self) -> ServiceModes {
        ServiceModes {
            cache: self.cache.mode(),
            rate_limiter: self.rate_limiter.mode(),
            task_queue: self.task_queue.mode(),
        }
    }

    /// Stop background work and drain the queue
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let timer = TimedOperation::start();
        self.shutdown.signal_shutdown();
        self.cache.shutdown().await;
        let drained = self.task_queue.shutdown().await;
        info!(
            drained = drained,
            elapsed_ms = timer.elapsed_ms(),
            "Application context shut down"
        );
    }
}
