use std::sync::{Arc, Barrier};

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{
    AnomalyEngine, AnomalyFeedEvent, AnomalyRecord, AnomalyRegistry, AnomalyStatusSummary,
    MetricPoint, MetricType, Severity, engine::EvaluationOutcome, summary::MetricState,
};
use crate::{config::AnomalySettings, error::CoreError, error::InputError};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
}

fn engine() -> AnomalyEngine {
    AnomalyEngine::new(AnomalySettings::default(), 5, Arc::new(AnomalyRegistry::new()))
}

fn feed(engine: &AnomalyEngine, server_id: &str, metric: MetricType, values: &[f64]) -> DateTime<Utc> {
    let mut at = start();
    for (idx, value) in values.iter().enumerate() {
        at = start() + Duration::seconds(idx as i64 * 30);
        engine
            .ingest(server_id, metric, MetricPoint::new(at, *value), at)
            .expect("valid sample");
    }
    at
}

fn record(id: u64, server_id: &str, metric: MetricType, detected_at: DateTime<Utc>) -> AnomalyRecord {
    AnomalyRecord {
        id,
        server_id: server_id.to_string(),
        metric_type: metric,
        severity: Severity::High,
        detected_at,
        resolved: false,
        resolved_at: None,
        metric_value: 90.0,
        baseline_mean: 40.0,
        baseline_stddev: 5.0,
    }
}

fn newest(outcomes: Vec<EvaluationOutcome>) -> EvaluationOutcome {
    outcomes.into_iter().last().expect("at least one judged sample")
}

#[test]
fn spike_creates_one_record_and_recovery_resolves_it() {
    let engine = engine();
    let now = feed(&engine, "web-1", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 95.0]);

    let outcomes = engine
        .evaluate("web-1", MetricType::Cpu, now)
        .expect("evaluation");
    assert_eq!(outcomes.len(), 6);
    let EvaluationOutcome::Created(created) = newest(outcomes) else {
        panic!("spike should create a record");
    };
    assert_eq!(created.severity, Severity::Critical);
    assert_eq!(created.metric_value, 95.0);
    assert!((created.baseline_mean - 21.0).abs() < 1e-9);

    assert!(
        engine
            .evaluate("web-1", MetricType::Cpu, now)
            .expect("evaluation")
            .is_empty()
    );
    assert_eq!(engine.registry().unresolved_count("web-1").unwrap(), 1);

    let later = now + Duration::seconds(30);
    engine
        .ingest("web-1", MetricType::Cpu, MetricPoint::new(later, 21.0), later)
        .expect("valid sample");
    let EvaluationOutcome::Normal { resolved } = newest(
        engine
            .evaluate("web-1", MetricType::Cpu, later)
            .expect("evaluation"),
    ) else {
        panic!("recovery should be normal");
    };
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, created.id);
    assert!(resolved[0].resolved);
    assert_eq!(resolved[0].resolved_at, Some(later));
    assert_eq!(engine.registry().unresolved_count("web-1").unwrap(), 0);
}

#[test]
fn spike_between_passes_is_still_flagged() {
    let engine = engine();
    let now = feed(
        &engine,
        "web-1",
        MetricType::Cpu,
        &[20.0, 22.0, 21.0, 19.0, 23.0, 21.0, 95.0, 21.0, 20.0, 22.0],
    );

    let pass = engine.evaluate_all(now).expect("pass");
    assert_eq!(pass.insufficient, 4);
    assert_eq!(pass.evaluated, 6);
    assert_eq!(pass.events.len(), 2);

    let AnomalyFeedEvent::Created(created) = &pass.events[0] else {
        panic!("the spike should be created first");
    };
    assert_eq!(created.metric_value, 95.0);
    assert_eq!(created.detected_at, start() + Duration::seconds(180));
    assert!((created.baseline_mean - 21.0).abs() < 1e-9);

    let AnomalyFeedEvent::Resolved(resolved) = &pass.events[1] else {
        panic!("the next normal sample should resolve it");
    };
    assert_eq!(resolved.id, created.id);
    assert_eq!(resolved.resolved_at, Some(start() + Duration::seconds(210)));
}

#[test]
fn samples_are_judged_once_across_passes() {
    let engine = engine();
    let now = feed(&engine, "db-1", MetricType::Memory, &[40.0, 41.0, 40.0, 42.0, 41.0, 40.0]);

    let first = engine.evaluate_all(now).expect("pass");
    assert_eq!((first.insufficient, first.evaluated), (4, 2));

    for offset in [30, 60] {
        let at = now + Duration::seconds(offset);
        engine
            .ingest("db-1", MetricType::Memory, MetricPoint::new(at, 41.0), at)
            .expect("valid sample");
    }
    let second = engine
        .evaluate_all(now + Duration::seconds(60))
        .expect("pass");
    assert_eq!((second.insufficient, second.evaluated), (0, 2));

    let idle = engine
        .evaluate_all(now + Duration::seconds(90))
        .expect("pass");
    assert_eq!((idle.insufficient, idle.evaluated), (0, 0));
}

#[test]
fn unknown_stream_has_nothing_to_judge() {
    let engine = engine();
    assert!(
        engine
            .evaluate("ghost", MetricType::Memory, start())
            .expect("evaluation")
            .is_empty()
    );
}

#[test]
fn short_stream_reports_insufficient_data() {
    let engine = engine();
    let now = feed(&engine, "web-1", MetricType::Disk, &[10.0, 11.0]);

    assert_eq!(
        engine
            .evaluate("web-1", MetricType::Disk, now)
            .expect("evaluation"),
        vec![
            EvaluationOutcome::InsufficientData {
                available: 1,
                required: 5,
            },
            EvaluationOutcome::InsufficientData {
                available: 2,
                required: 5,
            },
        ]
    );
}

#[test]
fn invalid_sample_is_surfaced_and_window_kept() {
    let engine = engine();
    let now = feed(&engine, "db-1", MetricType::Memory, &[40.0, 41.0, 40.0, 42.0, 41.0]);

    let error = engine
        .ingest("db-1", MetricType::Memory, MetricPoint::new(now, f64::INFINITY), now)
        .expect_err("non-finite rejected");
    assert!(matches!(
        error,
        CoreError::Input(InputError::NonFiniteValue { .. })
    ));

    let outcomes = engine
        .evaluate("db-1", MetricType::Memory, now)
        .expect("evaluation");
    assert_eq!(outcomes.len(), 5);
    assert!(matches!(
        newest(outcomes),
        EvaluationOutcome::Normal { .. }
    ));
}

#[test]
fn evaluate_all_collects_events_across_streams() {
    let engine = engine();
    feed(&engine, "web-1", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 95.0]);
    feed(&engine, "web-2", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 21.0]);
    feed(&engine, "web-2", MetricType::Disk, &[10.0, 10.0]);
    let now = start() + Duration::minutes(3);

    let pass = engine.evaluate_all(now).expect("pass");
    assert_eq!(pass.evaluated, 4);
    assert_eq!(pass.insufficient, 10);
    assert_eq!(pass.failed, 0);
    assert_eq!(pass.events.len(), 1);
    assert!(matches!(
        &pass.events[0],
        AnomalyFeedEvent::Created(record) if record.server_id == "web-1"
    ));
}

#[test]
fn concurrent_evaluations_of_one_stream_create_a_single_record() {
    let engine = engine();
    let now = feed(&engine, "web-1", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 95.0]);
    let workers = 8;
    let barrier = Barrier::new(workers);

    let outcomes = std::thread::scope(|scope| {
        let handles = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    engine
                        .evaluate("web-1", MetricType::Cpu, now)
                        .expect("evaluation")
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("worker finished"))
            .collect::<Vec<_>>()
    });

    let created = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, EvaluationOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(outcomes.len(), 6);
    assert_eq!(engine.registry().unresolved_count("web-1").unwrap(), 1);
}

#[test]
fn record_outside_the_window_does_not_block_a_new_one() {
    let registry = AnomalyRegistry::new();
    let now = start() + Duration::hours(1);
    registry
        .restore([record(7, "web-1", MetricType::Cpu, now - Duration::minutes(45))])
        .expect("restore");

    let since = now - Duration::minutes(30);
    assert!(
        registry
            .open_since("web-1", MetricType::Cpu, since)
            .unwrap()
            .is_none()
    );
    assert!(
        registry
            .open_since("web-1", MetricType::Cpu, now - Duration::hours(2))
            .unwrap()
            .is_some()
    );
}

#[test]
fn normal_sample_resolves_every_open_record_of_the_stream() {
    let registry = AnomalyRegistry::new();
    registry
        .restore([
            record(1, "web-1", MetricType::Cpu, start()),
            record(2, "web-1", MetricType::Cpu, start() + Duration::minutes(1)),
            record(3, "web-1", MetricType::Disk, start()),
        ])
        .expect("restore");

    let engine = AnomalyEngine::new(AnomalySettings::default(), 5, Arc::new(registry));
    let now = feed(&engine, "web-1", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 21.0]);
    let pass = engine.evaluate_all(now).expect("pass");

    let mut resolved = pass
        .events
        .iter()
        .map(|event| match event {
            AnomalyFeedEvent::Resolved(record) => record.id,
            AnomalyFeedEvent::Created(record) => panic!("unexpected record {}", record.id),
        })
        .collect::<Vec<_>>();
    resolved.sort();
    assert_eq!(resolved, vec![1, 2]);
    assert_eq!(engine.registry().unresolved_count("web-1").unwrap(), 1);
}

#[test]
fn restore_skips_resolved_records_and_continues_ids() {
    let registry = AnomalyRegistry::new();
    let mut done = record(41, "web-1", MetricType::Cpu, start());
    done.resolved = true;

    let restored = registry
        .restore([record(12, "web-1", MetricType::Memory, start()), done])
        .expect("restore");
    assert_eq!(restored, 1);

    let engine = AnomalyEngine::new(AnomalySettings::default(), 5, Arc::new(registry));
    let now = feed(&engine, "web-9", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 95.0]);
    let EvaluationOutcome::Created(created) =
        newest(engine.evaluate("web-9", MetricType::Cpu, now).unwrap())
    else {
        panic!("spike should create a record");
    };
    assert_eq!(created.id, 42);
}

#[test]
fn ids_continue_after_a_fully_resolved_history() {
    let registry = AnomalyRegistry::new();
    registry.continue_ids_after(7);
    registry.continue_ids_after(3);

    let engine = AnomalyEngine::new(AnomalySettings::default(), 5, Arc::new(registry));
    let now = feed(&engine, "web-1", MetricType::Cpu, &[20.0, 22.0, 21.0, 19.0, 23.0, 95.0]);
    let EvaluationOutcome::Created(created) =
        newest(engine.evaluate("web-1", MetricType::Cpu, now).unwrap())
    else {
        panic!("spike should create a record");
    };
    assert_eq!(created.id, 8);
}

#[test]
fn summary_reports_highest_severity_per_server() {
    let mut low = record(1, "web-1", MetricType::Cpu, start());
    low.severity = Severity::Low;
    let mut critical = record(2, "web-1", MetricType::Disk, start());
    critical.severity = Severity::Critical;
    let other = record(3, "web-2", MetricType::Memory, start());

    let summary = AnomalyStatusSummary::from_records("web-1", &[low, critical, other]);
    assert_eq!(summary.active, 2);
    assert_eq!(summary.highest_severity, Severity::Critical);
    assert_eq!(summary.metrics[&MetricType::Cpu], MetricState::Anomaly);
    assert_eq!(summary.metrics[&MetricType::Memory], MetricState::Normal);

    let quiet = AnomalyStatusSummary::from_records("web-3", &[]);
    assert_eq!(quiet.active, 0);
    assert_eq!(quiet.highest_severity, Severity::Ok);
}
