//! Admission filter benchmarks
//!
//! Measures the cost of one should_send decision per kind.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use k8s_openapi::api::batch::v1::{Job, JobCondition, JobSpec, JobStatus};
use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStatus, Event as CoreEvent, Pod, PodSpec, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kubewatch_gateway::{Event, EventFilter, Middleware};
use std::hint::black_box;

fn make_pod(restarts: i32) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some("bench-pod".to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec::default()),
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            container_statuses: Some(
                (0..4)
                    .map(|i| ContainerStatus {
                        name: format!("c{i}"),
                        restart_count: if i == 3 { restarts } else { 0 },
                        state: Some(ContainerState::default()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
    }
}

fn make_job(failed: bool) -> Job {
    let conditions = if failed {
        vec![JobCondition {
            type_: "Failed".to_string(),
            status: "True".to_string(),
            ..Default::default()
        }]
    } else {
        vec![]
    };
    Job {
        metadata: ObjectMeta {
            name: Some("bench-job".to_string()),
            ..Default::default()
        },
        spec: Some(JobSpec::default()),
        status: Some(JobStatus {
            conditions: Some(conditions),
            ..Default::default()
        }),
    }
}

fn bench_should_send(c: &mut Criterion) {
    let filter = EventFilter::with_enabled(true);

    let mut group = c.benchmark_group("should_send");
    group.throughput(Throughput::Elements(1));

    let quiet_pod = Event::updated(make_pod(0), make_pod(0));
    group.bench_function("pod_quiet_update", |b| {
        b.iter(|| filter.should_send(black_box(&quiet_pod)))
    });

    let restarted_pod = Event::updated(make_pod(2), make_pod(0));
    group.bench_function("pod_restarted", |b| {
        b.iter(|| filter.should_send(black_box(&restarted_pod)))
    });

    let failed_job = Event::updated(make_job(true), make_job(false));
    group.bench_function("job_failed", |b| {
        b.iter(|| filter.should_send(black_box(&failed_job)))
    });

    let warning = Event::created(CoreEvent {
        type_: Some("Warning".to_string()),
        reason: Some("BackOff".to_string()),
        ..Default::default()
    });
    group.bench_function("event_warning", |b| {
        b.iter(|| filter.should_send(black_box(&warning)))
    });

    let disabled = EventFilter::with_enabled(false);
    group.bench_function("disabled", |b| {
        b.iter(|| disabled.should_send(black_box(&quiet_pod)))
    });

    group.finish();
}

fn bench_middleware(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let filter = EventFilter::with_enabled(true);

    let mut group = c.benchmark_group("filter_middleware");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("pod_updates", |b| {
        b.iter(|| {
            rt.block_on(async {
                for i in 0..1000 {
                    let event = Event::updated(make_pod(i % 2), make_pod(0));
                    let _ = filter.process(event).await;
                }
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_should_send, bench_middleware);
criterion_main!(benches);
