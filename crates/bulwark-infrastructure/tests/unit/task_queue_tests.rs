//! Task queue behaviour in local mode

use bulwark_domain::error::{Error, HandlerError};
use bulwark_domain::value_objects::{
    EnqueueOptions, JobArgs, JobDefinition, JobId, JobName, JobPriority, JobStatus, ServiceMode,
};
use bulwark_infrastructure::config::{QueueConfig, StoreConfig};
use bulwark_infrastructure::queue::TaskQueue;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn fast_config() -> QueueConfig {
    QueueConfig {
        backoff_base_ms: 10,
        wait_poll_interval_ms: 10,
        drain_timeout_secs: 5,
        ..QueueConfig::default()
    }
}

async fn local_queue(config: &QueueConfig) -> TaskQueue {
    TaskQueue::new(config, &StoreConfig::default()).await.unwrap()
}

fn definition(name: &str) -> JobDefinition {
    JobDefinition::new(JobName::new(name).unwrap(), format!("{name} job"))
}

fn args(pairs: &[(&str, Value)]) -> JobArgs {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

async fn double(args: JobArgs) -> Result<Value, HandlerError> {
    let n = args.get("n").and_then(Value::as_i64).ok_or("missing n")?;
    Ok(json!(n * 2))
}

async fn wait_until_running(queue: &TaskQueue, id: &JobId) {
    for _ in 0..500 {
        if let Some(job) = queue.get_status(id).await {
            if job.status == JobStatus::Running {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never started");
}

// ============================================================================
// Execution and retries
// ============================================================================

#[tokio::test]
async fn test_successful_job_completes_with_result() {
    let queue = local_queue(&fast_config()).await;
    assert_eq!(queue.mode(), ServiceMode::Local);
    queue
        .register_handler(definition("answer"), |_args: JobArgs| async move {
            Ok::<_, HandlerError>(json!(42))
        })
        .unwrap();

    let id = queue
        .enqueue("answer", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result, Some(json!(42)));
    assert_eq!(job.retries, 0);
    assert_eq!(job.max_retries, 3);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn test_handler_receives_arguments() {
    let queue = local_queue(&fast_config()).await;
    queue.register_handler(definition("double"), double).unwrap();

    let id = queue
        .enqueue("double", EnqueueOptions::default(), args(&[("n", json!(21))]))
        .await
        .unwrap();
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();
    assert_eq!(job.result, Some(json!(42)));
}

#[tokio::test]
async fn test_always_failing_job_fails_after_max_retries() {
    let queue = local_queue(&fast_config()).await;
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    queue
        .register_handler(definition("flaky"), move |_args: JobArgs| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<Value, HandlerError>("upstream refused".into())
            }
        })
        .unwrap();

    let id = queue
        .enqueue(
            "flaky",
            EnqueueOptions::default().with_max_retries(2),
            JobArgs::new(),
        )
        .await
        .unwrap();
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.retries, 2);
    assert_eq!(job.error.as_deref(), Some("upstream refused"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let queue = local_queue(&fast_config()).await;
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    queue
        .register_handler(definition("eventually"), move |_args: JobArgs| {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err::<Value, HandlerError>("not yet".into());
                }
                Ok(json!("done"))
            }
        })
        .unwrap();

    let id = queue
        .enqueue("eventually", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.retries, 2);
    assert_eq!(job.result, Some(json!("done")));
    assert_eq!(job.error, None);
}

#[tokio::test]
async fn test_panicking_handler_is_a_failure() {
    let queue = local_queue(&fast_config()).await;
    queue
        .register_handler(definition("explodes"), |args: JobArgs| async move {
            if args.is_empty() {
                panic!("kaboom");
            }
            Ok::<_, HandlerError>(Value::Null)
        })
        .unwrap();

    let id = queue
        .enqueue(
            "explodes",
            EnqueueOptions::default().with_max_retries(0),
            JobArgs::new(),
        )
        .await
        .unwrap();
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("kaboom"));
}

#[tokio::test]
async fn test_priority_is_recorded() {
    let queue = local_queue(&fast_config()).await;
    queue
        .register_handler(definition("noop"), |_args: JobArgs| async move {
            Ok::<_, HandlerError>(Value::Null)
        })
        .unwrap();

    let id = queue
        .enqueue(
            "noop",
            EnqueueOptions::default().with_priority(JobPriority::Critical),
            JobArgs::new(),
        )
        .await
        .unwrap();
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();
    assert_eq!(job.priority, JobPriority::Critical);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_unknown_job_fails_fast() {
    let queue = local_queue(&fast_config()).await;
    let err = queue
        .enqueue("missing", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownJob { ref name } if name == "missing"));
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let queue = local_queue(&fast_config()).await;
    let handler = |_args: JobArgs| async move { Ok::<_, HandlerError>(Value::Null) };
    queue.register_handler(definition("once"), handler).unwrap();

    let err = queue
        .register_handler(definition("once"), handler)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateJob { .. }));
    assert_eq!(queue.registry().len(), 1);
}

// ============================================================================
// Status and waiting
// ============================================================================

#[tokio::test]
async fn test_unknown_id_has_no_status() {
    let queue = local_queue(&fast_config()).await;
    assert!(queue.get_status(&JobId::new()).await.is_none());
    assert!(
        queue
            .wait_for_job(&JobId::new(), Duration::from_millis(30))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_wait_timeout_does_not_cancel_the_job() {
    let queue = local_queue(&fast_config()).await;
    queue
        .register_handler(definition("slow"), |_args: JobArgs| async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok::<_, HandlerError>(json!("finished"))
        })
        .unwrap();

    let id = queue
        .enqueue("slow", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();

    assert!(
        queue
            .wait_for_job(&id, Duration::from_millis(50))
            .await
            .is_none()
    );
    let job = queue.wait_for_job(&id, WAIT).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_pending_jobs_are_listed_oldest_first() {
    let config = QueueConfig {
        workers: 1,
        ..fast_config()
    };
    let queue = local_queue(&config).await;
    queue
        .register_handler(definition("slow"), |_args: JobArgs| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, HandlerError>(Value::Null)
        })
        .unwrap();

    let first = queue
        .enqueue("slow", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();
    wait_until_running(&queue, &first).await;

    let second = queue
        .enqueue("slow", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let third = queue
        .enqueue("slow", EnqueueOptions::default(), JobArgs::new())
        .await
        .unwrap();

    let pending: Vec<JobId> = queue
        .get_pending_jobs()
        .await
        .into_iter()
        .map(|job| job.id)
        .collect();
    assert_eq!(pending, vec![second, third]);

    assert!(queue.shutdown().await);
    for id in [first, second, third] {
        assert_eq!(
            queue.get_status(&id).await.unwrap().status,
            JobStatus::Completed
        );
    }
}

// ============================================================================
// Scheduler interface
// ============================================================================

#[tokio::test]
async fn test_run_job_reports_result_synchronously() {
    let queue = local_queue(&fast_config()).await;
    queue
        .register_handler(
            definition("cleanup").with_schedule("0 3 * * *"),
            |_args: JobArgs| async move { Ok::<_, HandlerError>(json!({ "deleted": 3 })) },
        )
        .unwrap();

    let report = queue.run_job("cleanup").await.unwrap();
    assert!(report.success);
    assert_eq!(report.result, Some(json!({ "deleted": 3 })));
    assert_eq!(report.error, None);
    assert_eq!(report.name.as_str(), "cleanup");
}

#[tokio::test]
async fn test_run_job_reports_failure_without_retrying() {
    let queue = local_queue(&fast_config()).await;
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    queue
        .register_handler(definition("broken"), move |_args: JobArgs| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<Value, HandlerError>("disk full".into())
            }
        })
        .unwrap();

    let report = queue.run_job("broken").await.unwrap();
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("disk full"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_job_rejects_unknown_and_disabled_jobs() {
    let queue = local_queue(&fast_config()).await;
    queue
        .register_handler(
            definition("paused").with_enabled(false),
            |_args: JobArgs| async move { Ok::<_, HandlerError>(Value::Null) },
        )
        .unwrap();

    assert!(matches!(
        queue.run_job("paused").await.unwrap_err(),
        Error::JobDisabled { .. }
    ));
    assert!(matches!(
        queue.run_job("nope").await.unwrap_err(),
        Error::UnknownJob { .. }
    ));
}

#[tokio::test]
async fn test_list_jobs_is_sorted_by_name() {
    let queue = local_queue(&fast_config()).await;
    for name in ["send_digest", "cleanup", "reindex"] {
        queue
            .register_handler(definition(name), |_args: JobArgs| async move {
                Ok::<_, HandlerError>(Value::Null)
            })
            .unwrap();
    }

    let names: Vec<String> = queue
        .list_jobs()
        .into_iter()
        .map(|job| job.name.to_string())
        .collect();
    assert_eq!(names, ["cleanup", "reindex", "send_digest"]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_enqueue_after_shutdown_is_rejected() {
    let queue = local_queue(&fast_config()).await;
    queue
        .register_handler(definition("noop"), |_args: JobArgs| async move {
            Ok::<_, HandlerError>(Value::Null)
        })
        .unwrap();

    assert!(queue.shutdown().await);
    assert!(
        queue
            .enqueue("noop", EnqueueOptions::default(), JobArgs::new())
            .await
            .is_err()
    );
    assert!(queue.get_pending_jobs().await.is_empty());
}

#[tokio::test]
async fn test_local_mode_has_no_shared_worker() {
    let queue = local_queue(&fast_config()).await;
    assert!(queue.shared_worker().is_none());
}
