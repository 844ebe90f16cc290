//! Redis job store and dispatch list against a live server

use crate::support::{shared_store, unique_prefix};
use bulwark_domain::ports::{DispatchQueue, JobStore};
use bulwark_domain::value_objects::{Job, JobArgs, JobName, JobPriority, JobStatus};
use bulwark_providers::queue::RedisJobStore;
use std::time::Duration;

fn job(name: &str) -> Job {
    let mut args = JobArgs::new();
    args.insert("user_id".into(), serde_json::json!(7));
    Job::new(JobName::new(name).unwrap(), args, JobPriority::High, 3)
}

#[tokio::test]
async fn test_submit_pop_and_load() {
    let Some(store) = shared_store().await else {
        return;
    };
    let jobs = RedisJobStore::new(store, unique_prefix("jobs"), Duration::from_secs(60));
    let first = job("send_welcome");
    let second = job("send_digest");

    jobs.submit(&first).await.unwrap();
    jobs.submit(&second).await.unwrap();
    assert_eq!(DispatchQueue::len(&jobs).await.unwrap(), 2);
    assert_eq!(jobs.pending().await.unwrap().len(), 2);

    assert_eq!(jobs.pop().await.unwrap(), Some(first.id));
    let mut loaded = jobs.load(&first.id).await.unwrap().unwrap();
    assert_eq!(loaded.args.get("user_id"), Some(&serde_json::json!(7)));
    assert_eq!(loaded.priority, JobPriority::High);

    loaded.start().unwrap();
    jobs.save(&loaded).await.unwrap();
    assert_eq!(
        jobs.load(&first.id).await.unwrap().unwrap().status,
        JobStatus::Running
    );

    assert_eq!(jobs.pop().await.unwrap(), Some(second.id));
    assert_eq!(jobs.pop().await.unwrap(), None);
}
