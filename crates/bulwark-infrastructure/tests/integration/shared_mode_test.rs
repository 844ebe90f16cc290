//! Services against a live backing store

use bulwark_domain::error::HandlerError;
use bulwark_domain::value_objects::{
    EnqueueOptions, JobArgs, JobDefinition, JobName, JobStatus, ServiceMode,
};
use bulwark_infrastructure::AppContext;
use bulwark_infrastructure::config::AppConfig;
use serde_json::json;
use std::time::Duration;

const TEST_REDIS_URL_VAR: &str = "BULWARK_TEST_REDIS_URL";

/// A context in shared mode, `None` when no test server is configured
async fn shared_context() -> Option<AppContext> {
    let url = std::env::var(TEST_REDIS_URL_VAR).ok()?;
    let run = uuid::Uuid::new_v4().simple().to_string();

    let mut config = AppConfig::default();
    config.store.url = Some(url);
    config.cache.namespace = format!("bulwark-test-{run}");
    config.queue.key_prefix = format!("bulwark-test-jobs-{run}");
    config.queue.backoff_base_ms = 10;
    config.queue.worker_poll_interval_ms = 10;
    config
        .rate_limit
        .limits
        .insert("search".to_string(), "3/minute".to_string());

    let context = AppContext::init(config).await.unwrap();
    if context.modes().cache != ServiceMode::Shared {
        eprintln!("skipping: {TEST_REDIS_URL_VAR} is not reachable");
        context.shutdown().await;
        return None;
    }
    Some(context)
}

#[tokio::test]
async fn test_shared_context_selects_shared_mode_and_no_sweep() {
    let Some(context) = shared_context().await else {
        return;
    };
    let modes = context.modes();
    assert_eq!(modes.rate_limiter, ServiceMode::Shared);
    assert_eq!(modes.task_queue, ServiceMode::Shared);
    assert!(!context.cache().is_sweeping());
    assert_eq!(context.cache().sweep_expired().await, 0);
    context.shutdown().await;
}

#[tokio::test]
async fn test_shared_cache_roundtrip_and_expiry() {
    let Some(context) = shared_context().await else {
        return;
    };
    let cache = context.cache();

    assert!(cache.set("user:1", "Ann", Some(Duration::from_secs(1))).await);
    assert_eq!(cache.get::<String>("user:1").await.as_deref(), Some("Ann"));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(cache.get::<String>("user:1").await, None);

    for key in ["report:2024:01", "report:2024:02", "report:2023:12"] {
        cache.set(key, &1, None).await;
    }
    assert_eq!(cache.invalidate_pattern("report:2024:*").await, 2);
    assert!(cache.exists("report:2023:12").await);

    cache.clear().await;
    context.shutdown().await;
}

#[tokio::test]
async fn test_shared_rate_limit_admits_exactly_capacity() {
    let Some(context) = shared_context().await else {
        return;
    };
    let limiter = context.rate_limiter();
    let identifier = format!("ip:{}", uuid::Uuid::new_v4().simple());

    let decisions: Vec<bool> = {
        let mut decisions = Vec::new();
        for _ in 0..4 {
            decisions.push(limiter.check(&identifier, "search").await.allowed);
        }
        decisions
    };
    assert_eq!(decisions, [true, true, true, false]);

    assert!(limiter.reset(&identifier, "search").await);
    context.shutdown().await;
}

#[tokio::test]
async fn test_shared_jobs_run_on_the_external_worker() {
    let Some(context) = shared_context().await else {
        return;
    };
    let queue = context.task_queue();
    queue
        .register_handler(
            JobDefinition::new(JobName::new("answer").unwrap(), "returns 42"),
            |_args: JobArgs| async move { Ok::<_, HandlerError>(json!(42)) },
        )
        .unwrap();

    let id = queue
        .enqueue("answer", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();
    assert_eq!(
        queue.get_status(&id).await.unwrap().status,
        JobStatus::Pending
    );
    assert_eq!(queue.get_pending_jobs().await.len(), 1);

    let worker = queue.shared_worker().unwrap();
    assert!(worker.process_next().await.unwrap());

    let job = queue
        .wait_for_job(&id, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result, Some(json!(42)));
    context.shutdown().await;
}
