use serde::Deserialize;

use crate::anomaly::MetricType;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval: u64,
    #[serde(default = "default_anomaly_interval")]
    pub anomaly_interval: u64,
    #[serde(default = "default_status_report_interval")]
    pub status_report_interval: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default)]
    pub status: StatusSettings,
    #[serde(default)]
    pub liveness: Liveness,
    #[serde(default)]
    pub heartbeat_store: HeartbeatStoreConfig,
    #[serde(default)]
    pub anomaly: AnomalySettings,
    #[serde(default)]
    pub alerts: Alerts,
    #[serde(default)]
    pub anomaly_db: AnomalyDb,
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

/// Subset of the config that is re-applied on file change without restart.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub monitor_interval: u64,
    pub alerts: Alerts,
    pub servers: Vec<ServerEntry>,
}

impl RuntimeConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            monitor_interval: config.monitor_interval,
            alerts: config.alerts.clone(),
            servers: config.servers.clone(),
        }
    }

    pub fn server(&self, server_id: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|server| server.id == server_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusSettings {
    #[serde(default = "default_normal_threshold_secs")]
    pub normal_threshold_secs: u64,
    #[serde(default = "default_grace_threshold_secs")]
    pub grace_threshold_secs: u64,
    #[serde(default = "default_app_downtime_grace_trigger_secs")]
    pub app_downtime_grace_trigger_secs: u64,
    #[serde(default = "default_future_tolerance_secs")]
    pub future_tolerance_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Liveness {
    #[serde(default = "default_liveness_fast_ttl_secs")]
    pub fast_ttl_secs: u64,
    #[serde(default = "default_liveness_fallback_path")]
    pub fallback_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatStoreConfig {
    #[serde(default = "default_heartbeat_store_enabled")]
    pub enabled: bool,
    #[serde(default = "default_heartbeat_store_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalySettings {
    #[serde(default = "default_anomaly_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_anomaly_window_minutes")]
    pub window_minutes: u64,
    #[serde(default = "default_anomaly_trigger_stddev")]
    pub trigger_stddev: f64,
    #[serde(default = "default_anomaly_min_stddev")]
    pub min_stddev: f64,
    #[serde(default)]
    pub severity: SeverityBuckets,
    #[serde(default)]
    pub ceilings: AbsoluteCeilings,
}

/// Lower bounds, in standard deviations above the baseline mean, at which
/// each severity starts.
#[derive(Debug, Clone, Deserialize)]
pub struct SeverityBuckets {
    #[serde(default = "default_severity_low")]
    pub low: f64,
    #[serde(default = "default_severity_medium")]
    pub medium: f64,
    #[serde(default = "default_severity_high")]
    pub high: f64,
    #[serde(default = "default_severity_critical")]
    pub critical: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbsoluteCeilings {
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub memory: Option<f64>,
    #[serde(default = "default_ceiling_disk")]
    pub disk: Option<f64>,
    #[serde(default)]
    pub network: Option<f64>,
}

impl AbsoluteCeilings {
    pub fn for_metric(&self, metric: MetricType) -> Option<f64> {
        match metric {
            MetricType::Cpu => self.cpu,
            MetricType::Memory => self.memory,
            MetricType::Disk => self.disk,
            MetricType::Network => self.network,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alerts {
    #[serde(default = "default_alert_cpu")]
    pub cpu: f64,
    #[serde(default = "default_alert_memory")]
    pub memory: f64,
    #[serde(default = "default_alert_disk")]
    pub disk: f64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_hysteresis")]
    pub hysteresis: f64,
}

impl Alerts {
    pub fn threshold_for(&self, metric: MetricType) -> Option<f64> {
        match metric {
            MetricType::Cpu => Some(self.cpu),
            MetricType::Memory => Some(self.memory),
            MetricType::Disk => Some(self.disk),
            MetricType::Network => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyDb {
    #[serde(default = "default_anomaly_db_enabled")]
    pub enabled: bool,
    #[serde(default = "default_anomaly_db_dir")]
    pub dir: String,
    #[serde(default = "default_anomaly_db_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    #[serde(default = "default_anomaly_db_retention_days")]
    pub retention_days: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Simulation {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_simulation_profile")]
    pub profile: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerKind {
    #[default]
    Remote,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    pub id: String,
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default)]
    pub kind: ServerKind,
    #[serde(default)]
    pub monitoring_suspended: bool,
    /// Keep monitoring but stop fixed-threshold notifications.
    #[serde(default)]
    pub alert_suppressed: bool,
}
