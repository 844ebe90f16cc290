//! Local job store and dispatch queue

use bulwark_domain::ports::{DispatchQueue, JobStore};
use bulwark_domain::value_objects::{Job, JobArgs, JobName, JobPriority, JobStatus};
use bulwark_providers::queue::{LocalJobStore, MemoryDispatchQueue};

fn job(name: &str) -> Job {
    Job::new(
        JobName::new(name).unwrap(),
        JobArgs::new(),
        JobPriority::Low,
        2,
    )
}

#[tokio::test]
async fn test_save_replaces_existing_record() {
    let store = LocalJobStore::new();
    let mut record = job("reindex");
    store.save(&record).await.unwrap();

    record.start().unwrap();
    record.complete(serde_json::json!({"indexed": 12})).unwrap();
    store.save(&record).await.unwrap();

    let loaded = store.load(&record.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::Completed);
    assert_eq!(loaded.result, Some(serde_json::json!({"indexed": 12})));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_pending_is_ordered_by_creation() {
    let store = LocalJobStore::new();
    let first = job("first");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = job("second");
    store.save(&second).await.unwrap();
    store.save(&first).await.unwrap();

    let pending = store.pending().await.unwrap();
    let ids: Vec<_> = pending.iter().map(|job| job.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_submitted_job_is_visible_before_pop() {
    let queue = MemoryDispatchQueue::new();
    let record = job("notify");
    queue.submit(&record).await.unwrap();

    assert_eq!(queue.pending().await.unwrap().len(), 1);
    assert_eq!(queue.pop().await.unwrap(), Some(record.id));
    assert_eq!(DispatchQueue::len(&queue).await.unwrap(), 0);
}
