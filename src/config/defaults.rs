use super::schema::{
    AbsoluteCeilings, Alerts, AnomalyDb, AnomalySettings, HeartbeatStoreConfig, Liveness,
    SeverityBuckets, Simulation, StatusSettings,
};

pub(super) fn default_monitor_interval() -> u64 {
    30
}

pub(super) fn default_anomaly_interval() -> u64 {
    300
}

pub(super) fn default_status_report_interval() -> u64 {
    60
}

pub(super) fn default_probe_timeout_secs() -> u64 {
    5
}

pub(super) fn default_normal_threshold_secs() -> u64 {
    60
}

pub(super) fn default_grace_threshold_secs() -> u64 {
    600
}

pub(super) fn default_app_downtime_grace_trigger_secs() -> u64 {
    300
}

pub(super) fn default_future_tolerance_secs() -> u64 {
    5
}

pub(super) fn default_liveness_fast_ttl_secs() -> u64 {
    300
}

pub(super) fn default_liveness_fallback_path() -> String {
    "data/app_heartbeat.json".to_string()
}

pub(super) fn default_heartbeat_store_enabled() -> bool {
    true
}

pub(super) fn default_heartbeat_store_path() -> String {
    "data/heartbeats".to_string()
}

pub(super) fn default_anomaly_min_samples() -> usize {
    5
}

pub(super) fn default_anomaly_window_minutes() -> u64 {
    30
}

pub(super) fn default_anomaly_trigger_stddev() -> f64 {
    2.0
}

pub(super) fn default_anomaly_min_stddev() -> f64 {
    0.5
}

pub(super) fn default_severity_low() -> f64 {
    2.0
}

pub(super) fn default_severity_medium() -> f64 {
    3.0
}

pub(super) fn default_severity_high() -> f64 {
    4.0
}

pub(super) fn default_severity_critical() -> f64 {
    6.0
}

pub(super) fn default_ceiling_disk() -> Option<f64> {
    Some(90.0)
}

pub(super) fn default_alert_cpu() -> f64 {
    80.0
}

pub(super) fn default_alert_memory() -> f64 {
    85.0
}

pub(super) fn default_alert_disk() -> f64 {
    90.0
}

pub(super) fn default_cooldown_secs() -> u64 {
    300
}

pub(super) fn default_hysteresis() -> f64 {
    5.0
}

pub(super) fn default_anomaly_db_enabled() -> bool {
    true
}

pub(super) fn default_anomaly_db_dir() -> String {
    "logs/anomalies".to_string()
}

pub(super) fn default_anomaly_db_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024
}

pub(super) fn default_anomaly_db_retention_days() -> u16 {
    7
}

pub(super) fn default_simulation_profile() -> String {
    "wave".to_string()
}

pub(super) fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

pub(super) fn default_server_port() -> u16 {
    22
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            normal_threshold_secs: default_normal_threshold_secs(),
            grace_threshold_secs: default_grace_threshold_secs(),
            app_downtime_grace_trigger_secs: default_app_downtime_grace_trigger_secs(),
            future_tolerance_secs: default_future_tolerance_secs(),
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            fast_ttl_secs: default_liveness_fast_ttl_secs(),
            fallback_path: default_liveness_fallback_path(),
        }
    }
}

impl Default for HeartbeatStoreConfig {
    fn default() -> Self {
        Self {
            enabled: default_heartbeat_store_enabled(),
            path: default_heartbeat_store_path(),
        }
    }
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            min_samples: default_anomaly_min_samples(),
            window_minutes: default_anomaly_window_minutes(),
            trigger_stddev: default_anomaly_trigger_stddev(),
            min_stddev: default_anomaly_min_stddev(),
            severity: SeverityBuckets::default(),
            ceilings: AbsoluteCeilings::default(),
        }
    }
}

impl Default for SeverityBuckets {
    fn default() -> Self {
        Self {
            low: default_severity_low(),
            medium: default_severity_medium(),
            high: default_severity_high(),
            critical: default_severity_critical(),
        }
    }
}

impl Default for AbsoluteCeilings {
    fn default() -> Self {
        Self {
            cpu: None,
            memory: None,
            disk: default_ceiling_disk(),
            network: None,
        }
    }
}

impl Default for Alerts {
    fn default() -> Self {
        Self {
            cpu: default_alert_cpu(),
            memory: default_alert_memory(),
            disk: default_alert_disk(),
            cooldown_secs: default_cooldown_secs(),
            hysteresis: default_hysteresis(),
        }
    }
}

impl Default for AnomalyDb {
    fn default() -> Self {
        Self {
            enabled: default_anomaly_db_enabled(),
            dir: default_anomaly_db_dir(),
            max_file_size_bytes: default_anomaly_db_max_file_size_bytes(),
            retention_days: default_anomaly_db_retention_days(),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            enabled: false,
            profile: default_simulation_profile(),
        }
    }
}
