//! Application context lifecycle without a backing store

use bulwark_domain::error::HandlerError;
use bulwark_domain::value_objects::{
    EnqueueOptions, JobArgs, JobDefinition, JobName, JobStatus, ServiceMode,
};
use bulwark_infrastructure::config::AppConfig;
use bulwark_infrastructure::{AppContext, ServiceModes};
use serde_json::json;
use std::time::Duration;

const ALL_LOCAL: ServiceModes = ServiceModes {
    cache: ServiceMode::Local,
    rate_limiter: ServiceMode::Local,
    task_queue: ServiceMode::Local,
};

#[tokio::test]
async fn test_context_without_store_runs_everything_locally() {
    let context = AppContext::init(AppConfig::default()).await.unwrap();
    assert_eq!(context.modes(), ALL_LOCAL);
    assert!(context.cache().is_sweeping());

    let cache = context.cache();
    assert!(cache.set("greeting", "hello", None).await);
    assert_eq!(cache.get::<String>("greeting").await.as_deref(), Some("hello"));

    let limiter = context.rate_limiter();
    assert!(limiter.check("ip:10.0.0.1", "auth").await.allowed);

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
    let job = queue
        .wait_for_job(&id, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result, Some(json!(42)));

    context.shutdown().await;
    assert!(context.shutdown_coordinator().is_shutting_down());
    assert!(!context.cache().is_sweeping());

    // Idempotent
    context.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_store_degrades_to_local() {
    let mut config = AppConfig::default();
    config.store.url = Some("redis://127.0.0.1:1".to_string());
    config.store.connect_timeout_ms = 300;

    let context = AppContext::init(config).await.unwrap();
    assert_eq!(context.modes(), ALL_LOCAL);
    context.shutdown().await;
}

#[tokio::test]
async fn test_invalid_configuration_fails_init() {
    let mut config = AppConfig::default();
    config.queue.workers = 0;
    let err = AppContext::init(config).await.unwrap_err();
    assert!(err.is_configuration());

    let mut config = AppConfig::default();
    config
        .rate_limit
        .limits
        .insert("search".to_string(), "10/fortnight".to_string());
    assert!(AppContext::init(config).await.unwrap_err().is_configuration());
}

#[tokio::test]
async fn test_modes_serialize_for_reporting() {
    let context = AppContext::init(AppConfig::default()).await.unwrap();
    let modes = serde_json::to_value(context.modes()).unwrap();
    assert_eq!(
        modes,
        json!({ "cache": "local", "rate_limiter": "local", "task_queue": "local" })
    );
    context.shutdown().await;
}
