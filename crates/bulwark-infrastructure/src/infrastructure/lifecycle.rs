//! Service Lifecycle Management
//!
//! [`ShutdownCoordinator`] is the single shutdown signal of an application
//! context. [`PeriodicTask`] runs a job on a fixed cadence until its token,
//! a child of the coordinator's, is cancelled; stopping it joins the task so
//! nothing outlives the context.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Broadcast shutdown signal
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every listener to stop
    pub fn signal_shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("Shutdown signal received");
        }
        self.token.cancel();
    }

    /// Whether shutdown has been signalled
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait asynchronously for the shutdown signal
    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }

    /// A token cancelled together with this coordinator
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

/// A cancellable task running at a fixed interval
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period`, first run one period from now
    ///
    /// The task stops when `parent` or the task's own token is cancelled.
    pub fn spawn<F, Fut>(
        name: impl Into<String>,
        period: Duration,
        parent: &CancellationToken,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let token = parent.child_token();
        let task_token = token.clone();
        let task_name = name.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => tick().await,
                }
            }
            debug!(task = %task_name, "Periodic task stopped");
        });

        debug!(task = %name, period_ms = period.as_millis() as u64, "Periodic task started");
        Self {
            name,
            token,
            handle,
        }
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the task and wait for it to finish
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(task = %self.name, error = %e, "Periodic task ended abnormally");
        }
    }
}
