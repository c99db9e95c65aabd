use std::{fs, path::Path, sync::Arc};

use notify::{Event, EventKind, event::{AccessKind, ModifyKind}};
use tempfile::tempdir;

use crate::{
    app_context::AppContext,
    config::{RuntimeConfig, load_config},
    heartbeat::MemoryHeartbeatStore,
    liveness::{AppLivenessTracker, MemoryLivenessStore},
    monitor::MonitorCore,
};

use super::{FleetChanges, apply_runtime_reload_from_path, touches_config, watch_target};

fn config_toml(monitor_interval: u64, cpu_threshold: f64, suspend_db: bool) -> String {
    format!(
        r#"monitor_interval = {monitor_interval}
anomaly_interval = 300

[status]
normal_threshold_secs = 60
grace_threshold_secs = 600
app_downtime_grace_trigger_secs = 300

[alerts]
cpu = {cpu_threshold}
memory = 90.0
disk = 90.0
cooldown_secs = 300
hysteresis = 5.0

[anomaly_db]
enabled = false
dir = "logs/anomalies"

[[servers]]
id = "web-1"
host = "10.0.0.10"

[[servers]]
id = "db-1"
host = "10.0.0.20"
port = 2222
monitoring_suspended = {suspend_db}
"#
    )
}

fn app_for(path: &std::path::Path) -> AppContext {
    let initial = load_config(path).expect("initial config should load");
    let liveness = AppLivenessTracker::new(
        Arc::new(MemoryLivenessStore::with_ttl_secs(300)),
        Arc::new(MemoryLivenessStore::with_ttl_secs(3600)),
    );
    let core = MonitorCore::new(&initial, Arc::new(MemoryHeartbeatStore::new()), liveness);
    AppContext::new(initial, path.to_string_lossy().to_string(), core)
}

#[tokio::test]
async fn hot_reload_applies_valid_runtime_changes_without_restart() {
    let temp = tempdir().expect("tempdir should be created");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, config_toml(30, 85.0, false)).expect("initial config should be written");
    let app = app_for(&config_path);

    fs::write(&config_path, config_toml(12, 72.5, true)).expect("updated config should be written");

    let applied = apply_runtime_reload_from_path(&app, &config_path.to_string_lossy())
        .await
        .expect("valid hot-reload should apply");

    let current = app.runtime_config.read().await.clone();
    assert_eq!(applied.runtime_config.monitor_interval, 12);
    assert!((applied.runtime_config.alerts.cpu - 72.5).abs() < f64::EPSILON);
    assert_eq!(
        applied.changes,
        FleetChanges {
            suspended: vec!["db-1".to_string()],
            ..FleetChanges::default()
        }
    );
    assert_eq!(current.monitor_interval, 12);
    assert!(current.server("db-1").expect("db-1 configured").monitoring_suspended);
    assert_eq!(current.server("db-1").expect("db-1 configured").port, 2222);
}

#[tokio::test]
async fn hot_reload_rejects_invalid_config_and_preserves_last_runtime() {
    let temp = tempdir().expect("tempdir should be created");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, config_toml(30, 85.0, false)).expect("initial config should be written");
    let app = app_for(&config_path);
    let expected_runtime = RuntimeConfig::from_config(&app.config);

    fs::write(&config_path, config_toml(0, 72.5, true)).expect("invalid config should be written");

    let error = apply_runtime_reload_from_path(&app, &config_path.to_string_lossy())
        .await
        .expect_err("invalid config should be rejected");
    assert!(error.contains("monitor_interval must be greater than 0"));

    let current = app.runtime_config.read().await.clone();
    assert_eq!(current.monitor_interval, expected_runtime.monitor_interval);
    assert!((current.alerts.cpu - expected_runtime.alerts.cpu).abs() < f64::EPSILON);
    assert!(!current.server("db-1").expect("db-1 configured").monitoring_suspended);
}

#[test]
fn fleet_changes_report_added_removed_and_resumed_servers() {
    let temp = tempdir().expect("tempdir should be created");
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, config_toml(30, 85.0, true)).expect("config should be written");
    let previous = RuntimeConfig::from_config(&load_config(&config_path).expect("config loads"));

    let mut next = previous.clone();
    next.servers.retain(|server| server.id != "web-1");
    next.servers[0].monitoring_suspended = false;
    let mut added = next.servers[0].clone();
    added.id = "cache-1".to_string();
    next.servers.push(added);

    let changes = FleetChanges::between(&previous, &next);
    assert_eq!(changes.added, vec!["cache-1".to_string()]);
    assert_eq!(changes.removed, vec!["web-1".to_string()]);
    assert_eq!(changes.resumed, vec!["db-1".to_string()]);
    assert!(changes.suspended.is_empty());
}

#[test]
fn only_writes_to_the_config_file_trigger_a_reload() {
    let config_file = Path::new("/etc/fleetwatch/config.toml");
    let write = Event::new(EventKind::Modify(ModifyKind::Any))
        .add_path("/etc/fleetwatch/config.toml".into());
    let sibling = Event::new(EventKind::Modify(ModifyKind::Any))
        .add_path("/etc/fleetwatch/notes.txt".into());
    let read = Event::new(EventKind::Access(AccessKind::Any))
        .add_path("/etc/fleetwatch/config.toml".into());

    assert!(touches_config(&write, config_file));
    assert!(!touches_config(&sibling, config_file));
    assert!(!touches_config(&read, config_file));
    assert_eq!(watch_target(config_file), Path::new("/etc/fleetwatch"));
    assert_eq!(watch_target(Path::new("config.toml")), Path::new("."));
}
