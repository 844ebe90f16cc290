//! Job entity serialisation and state machine

use bulwark_domain::value_objects::{
    EnqueueOptions, Job, JobArgs, JobDefinition, JobId, JobName, JobPriority, JobStatus,
};

fn sample_job() -> Job {
    let mut args = JobArgs::new();
    args.insert("report_id".into(), serde_json::json!("r-17"));
    Job::new(
        JobName::new("render_report").unwrap(),
        args,
        JobPriority::Critical,
        2,
    )
}

#[test]
fn test_job_wire_format_uses_lowercase_enums() {
    let job = sample_job();
    let value = serde_json::to_value(&job).unwrap();

    assert_eq!(value["name"], "render_report");
    assert_eq!(value["priority"], "critical");
    assert_eq!(value["status"], "pending");
    assert_eq!(value["retries"], 0);
    assert_eq!(value["max_retries"], 2);
    assert_eq!(value["id"], job.id.to_string());
}

#[test]
fn test_job_record_decodes_back() {
    let job = sample_job();
    let text = serde_json::to_string(&job).unwrap();
    let decoded: Job = serde_json::from_str(&text).unwrap();
    assert_eq!(decoded, job);
}

#[test]
fn test_invalid_job_name_is_rejected_on_decode() {
    let job = sample_job();
    let mut value = serde_json::to_value(&job).unwrap();
    value["name"] = serde_json::json!("no spaces allowed");
    assert!(serde_json::from_value::<Job>(value).is_err());
}

#[test]
fn test_failure_path_with_two_retries() {
    let mut job = sample_job();
    let mut attempts = 0;

    loop {
        job.start().unwrap();
        attempts += 1;
        if job.can_retry() {
            job.retry("handler raised".into()).unwrap();
            assert_eq!(job.status, JobStatus::Retrying);
        } else {
            job.fail("handler raised".into()).unwrap();
            break;
        }
    }

    assert_eq!(attempts, 3);
    assert_eq!(job.retries, 2);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.completed_at.is_some());
}

#[test]
fn test_status_transitions() {
    assert!(JobStatus::Pending.can_transition_to(JobStatus::Running));
    assert!(JobStatus::Retrying.can_transition_to(JobStatus::Running));
    assert!(JobStatus::Running.can_transition_to(JobStatus::Retrying));
    assert!(!JobStatus::Pending.can_transition_to(JobStatus::Failed));
    assert!(!JobStatus::Completed.can_transition_to(JobStatus::Running));
    assert!(!JobStatus::Failed.can_transition_to(JobStatus::Retrying));
}

#[test]
fn test_job_id_parse() {
    let id = JobId::new();
    assert_eq!(id.to_string().parse::<JobId>().unwrap(), id);
    assert!("not-a-uuid".parse::<JobId>().is_err());
}

#[test]
fn test_priority_parse_and_default() {
    assert_eq!("HIGH".parse::<JobPriority>().unwrap(), JobPriority::High);
    assert!("urgent".parse::<JobPriority>().is_err());
    assert_eq!(EnqueueOptions::default().priority, JobPriority::Normal);
    assert_eq!(EnqueueOptions::default().max_retries, None);
}

#[test]
fn test_definition_builder() {
    let definition = JobDefinition::new(JobName::new("cleanup").unwrap(), "Remove stale rows")
        .with_schedule("0 3 * * *")
        .with_enabled(false);
    assert_eq!(definition.schedule.as_deref(), Some("0 3 * * *"));
    assert!(!definition.enabled);
}
