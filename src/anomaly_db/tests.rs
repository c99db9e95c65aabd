use std::fs;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use super::{append_events, read::read_entries, replay_journal, run_maintenance};
use crate::anomaly::{AnomalyFeedEvent, AnomalyRecord, MetricType, Severity};
use crate::config::AnomalyDb;

fn settings(dir: &std::path::Path) -> AnomalyDb {
    AnomalyDb {
        enabled: true,
        dir: dir.display().to_string(),
        max_file_size_bytes: 1024 * 1024,
        retention_days: 7,
    }
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 0).unwrap()
}

fn record(id: u64, metric: MetricType) -> AnomalyRecord {
    AnomalyRecord {
        id,
        server_id: "web-1".to_string(),
        metric_type: metric,
        severity: Severity::Medium,
        detected_at: at(),
        resolved: false,
        resolved_at: None,
        metric_value: 88.0,
        baseline_mean: 50.0,
        baseline_stddev: 10.0,
    }
}

#[test]
fn replay_keeps_only_records_never_resolved() {
    let temp = tempfile::tempdir().expect("temp dir");
    let settings = settings(temp.path());

    let mut closed = record(2, MetricType::Memory);
    append_events(
        &settings,
        &[
            AnomalyFeedEvent::Created(record(1, MetricType::Cpu)),
            AnomalyFeedEvent::Created(closed.clone()),
        ],
        at(),
    )
    .expect("append");

    closed.resolved = true;
    closed.resolved_at = Some(at() + Duration::minutes(5));
    let written = append_events(
        &settings,
        &[AnomalyFeedEvent::Resolved(closed)],
        at() + Duration::minutes(5),
    )
    .expect("append");
    assert_eq!(written, 1);

    let replay = replay_journal(&settings).expect("replay");
    assert_eq!(replay.unresolved.len(), 1);
    assert_eq!(replay.unresolved[0].id, 1);
    assert_eq!(replay.unresolved[0].metric_type, MetricType::Cpu);
    assert_eq!(replay.last_id, 2);
}

#[test]
fn replay_of_resolved_history_still_reports_last_id() {
    let temp = tempfile::tempdir().expect("temp dir");
    let settings = settings(temp.path());

    let events = [3, 1]
        .into_iter()
        .flat_map(|id| {
            let created = record(id, MetricType::Disk);
            let mut resolved = created.clone();
            resolved.resolved = true;
            resolved.resolved_at = Some(at() + Duration::minutes(1));
            [
                AnomalyFeedEvent::Created(created),
                AnomalyFeedEvent::Resolved(resolved),
            ]
        })
        .collect::<Vec<_>>();
    append_events(&settings, &events, at()).expect("append");

    let replay = replay_journal(&settings).expect("replay");
    assert!(replay.unresolved.is_empty());
    assert_eq!(replay.last_id, 3);
}

#[test]
fn disabled_journal_replays_nothing() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut settings = settings(temp.path());
    append_events(
        &settings,
        &[AnomalyFeedEvent::Created(record(9, MetricType::Cpu))],
        at(),
    )
    .expect("append");

    settings.enabled = false;
    let replay = replay_journal(&settings).expect("replay");
    assert!(replay.unresolved.is_empty());
    assert_eq!(replay.last_id, 0);
}

#[test]
fn unreadable_lines_are_skipped() {
    let temp = tempfile::tempdir().expect("temp dir");
    let settings = settings(temp.path());
    append_events(
        &settings,
        &[AnomalyFeedEvent::Created(record(5, MetricType::Disk))],
        at(),
    )
    .expect("append");

    let file = temp.path().join("events").join("events-2026-08-03.jsonl");
    let mut content = fs::read_to_string(&file).expect("journal written");
    content.push_str("{not json\n");
    fs::write(&file, content).expect("rewrite");

    let entries = read_entries(&settings).expect("read");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event.kind(), "created");
}

#[test]
fn disabled_journal_writes_nothing() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut settings = settings(temp.path());
    settings.enabled = false;

    let written = append_events(
        &settings,
        &[AnomalyFeedEvent::Created(record(1, MetricType::Cpu))],
        at(),
    )
    .expect("append");
    assert_eq!(written, 0);
    assert!(!temp.path().join("events").exists());
}

#[test]
fn maintenance_removes_files_past_retention() {
    let temp = tempfile::tempdir().expect("temp dir");
    let settings = settings(temp.path());
    let events = temp.path().join("events");
    fs::create_dir_all(&events).expect("dir");
    fs::write(events.join("events-2026-07-01.jsonl"), "").expect("old file");
    fs::write(events.join("events-2026-07-01.jsonl.1"), "").expect("old rotated file");
    fs::write(events.join("events-2026-08-01.jsonl"), "").expect("recent file");
    fs::write(events.join("notes.txt"), "").expect("unrelated file");

    let today = NaiveDate::from_ymd_opt(2026, 8, 3).expect("date");
    assert_eq!(run_maintenance(&settings, today), 2);
    assert!(events.join("events-2026-08-01.jsonl").exists());
    assert!(events.join("notes.txt").exists());
}
