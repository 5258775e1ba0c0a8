//! Rule for Jobs
//!
//! Creation and deletion always pass. Updates pass when the spec changed or
//! the Job has failed.

use crate::event::{ChangeReason, Event, ResourceObject};
use k8s_openapi::api::batch::v1::Job;
use tracing::{debug, warn};

pub(super) fn should_send(event: &Event) -> bool {
    match event.reason {
        ChangeReason::Created | ChangeReason::Deleted => true,
        ChangeReason::Updated => should_send_update(event),
        ChangeReason::Other(_) => false,
    }
}

fn should_send_update(event: &Event) -> bool {
    let ResourceObject::Job(job) = &event.current else {
        warn!(
            name = event.name(),
            "Unable to cast Job object for filtering, sending event"
        );
        return true;
    };

    // Nothing to compare against
    let Some(ResourceObject::Job(old_job)) = &event.previous else {
        return true;
    };

    let name = event.name();

    // Deep comparison: any field difference counts; no spec is the empty spec
    if super::spec_changed(&job.spec, &old_job.spec) {
        debug!(job = name, "Job spec changed, sending update event");
        return true;
    }

    if has_failed(job) {
        debug!(job = name, "Job failed, sending update event");
        return true;
    }

    debug!(
        job = name,
        "Filtering out Job update event (no spec change or failure detected)"
    );
    false
}

/// Any condition `Failed` with status `True`
fn has_failed(job: &Job) -> bool {
    job.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Failed" && c.status == "True")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::{JobCondition, JobSpec, JobStatus};
    use serde_json::json;

    fn job_with_parallelism(parallelism: i32) -> Job {
        Job {
            spec: Some(JobSpec {
                parallelism: Some(parallelism),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn with_conditions(mut job: Job, conditions: &[(&str, &str)]) -> Job {
        job.status = Some(JobStatus {
            conditions: Some(
                conditions
                    .iter()
                    .map(|(type_, status)| JobCondition {
                        type_: type_.to_string(),
                        status: status.to_string(),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        });
        job
    }

    #[test]
    fn test_created_and_deleted_are_sent() {
        assert!(should_send(&Event::created(Job::default())));
        assert!(should_send(&Event::deleted(Job::default())));
    }

    #[test]
    fn test_spec_change_is_sent() {
        let event = Event::updated(job_with_parallelism(2), job_with_parallelism(1));
        assert!(should_send(&event));
    }

    #[test]
    fn test_failure_is_sent() {
        let failed = with_conditions(job_with_parallelism(1), &[("Failed", "True")]);
        let event = Event::updated(failed, job_with_parallelism(1));
        assert!(should_send(&event));
    }

    #[test]
    fn test_failure_found_anywhere_in_conditions() {
        let failed = with_conditions(
            job_with_parallelism(1),
            &[("Suspended", "False"), ("FailureTarget", "True"), ("Failed", "True")],
        );
        assert!(should_send(&Event::updated(failed, job_with_parallelism(1))));
    }

    #[test]
    fn test_failed_condition_must_be_true() {
        let not_failed = with_conditions(
            job_with_parallelism(1),
            &[("Failed", "False"), ("Failed", "Unknown"), ("Complete", "True")],
        );
        assert!(!should_send(&Event::updated(
            not_failed,
            job_with_parallelism(1)
        )));
    }

    #[test]
    fn test_unchanged_update_is_dropped() {
        let event = Event::updated(job_with_parallelism(1), job_with_parallelism(1));
        assert!(!should_send(&event));
    }

    #[test]
    fn test_status_only_change_is_dropped() {
        let mut current = job_with_parallelism(1);
        current.status = Some(JobStatus {
            active: Some(1),
            ..Default::default()
        });
        assert!(!should_send(&Event::updated(current, job_with_parallelism(1))));
    }

    #[test]
    fn test_missing_previous_is_sent() {
        let event = Event::new("Job", "Updated", job_with_parallelism(1));
        assert!(should_send(&event));
    }

    #[test]
    fn test_previous_of_wrong_shape_is_sent() {
        let event = Event::new("Job", "Updated", job_with_parallelism(1))
            .with_previous(json!({"kind": "Job"}));
        assert!(should_send(&event));
    }

    #[test]
    fn test_current_of_wrong_shape_is_sent() {
        let event = Event::new("Job", "Updated", json!({"kind": "Job"}))
            .with_previous(job_with_parallelism(1));
        assert!(should_send(&event));
    }

    #[test]
    fn test_other_reasons_are_dropped() {
        let event = Event::new("Job", "Synced", job_with_parallelism(1))
            .with_previous(job_with_parallelism(2));
        assert!(!should_send(&event));
    }

    #[test]
    fn test_missing_spec_matches_empty_spec() {
        let empty_spec = Job {
            spec: Some(JobSpec::default()),
            ..Default::default()
        };
        assert!(!should_send(&Event::updated(empty_spec, Job::default())));
        assert!(should_send(&Event::updated(
            job_with_parallelism(1),
            Job::default()
        )));
    }
}
