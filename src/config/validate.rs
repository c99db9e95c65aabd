use std::collections::HashSet;

use thiserror::Error;

use super::schema::Config;

const MAX_LIVENESS_TTL_SECS: u64 = 24 * 3600;
const MAX_ANOMALY_WINDOW_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor_interval == 0 {
            return Err(ConfigError::Validation(
                "monitor_interval must be greater than 0".to_string(),
            ));
        }
        if self.anomaly_interval == 0 {
            return Err(ConfigError::Validation(
                "anomaly_interval must be greater than 0".to_string(),
            ));
        }
        if self.status_report_interval == 0 {
            return Err(ConfigError::Validation(
                "status_report_interval must be greater than 0".to_string(),
            ));
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "probe_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.status.normal_threshold_secs == 0 {
            return Err(ConfigError::Validation(
                "status.normal_threshold_secs must be greater than 0".to_string(),
            ));
        }
        if self.status.grace_threshold_secs < self.status.normal_threshold_secs {
            return Err(ConfigError::Validation(
                "status.grace_threshold_secs must not be smaller than status.normal_threshold_secs"
                    .to_string(),
            ));
        }
        if self.status.app_downtime_grace_trigger_secs == 0 {
            return Err(ConfigError::Validation(
                "status.app_downtime_grace_trigger_secs must be greater than 0".to_string(),
            ));
        }

        if self.liveness.fast_ttl_secs == 0 || self.liveness.fast_ttl_secs > MAX_LIVENESS_TTL_SECS
        {
            return Err(ConfigError::Validation(format!(
                "liveness.fast_ttl_secs must be between 1 and {}",
                MAX_LIVENESS_TTL_SECS
            )));
        }
        if self.liveness.fallback_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "liveness.fallback_path must not be empty".to_string(),
            ));
        }

        if self.heartbeat_store.enabled && self.heartbeat_store.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "heartbeat_store.path must not be empty when heartbeat_store.enabled is true"
                    .to_string(),
            ));
        }

        self.validate_anomaly()?;

        validate_percentage("alerts.cpu", self.alerts.cpu)?;
        validate_percentage("alerts.memory", self.alerts.memory)?;
        validate_percentage("alerts.disk", self.alerts.disk)?;
        if self.alerts.cooldown_secs == 0 {
            return Err(ConfigError::Validation(
                "alerts.cooldown_secs must be greater than 0".to_string(),
            ));
        }
        if self.alerts.hysteresis.is_nan() || self.alerts.hysteresis.is_sign_negative() {
            return Err(ConfigError::Validation(
                "alerts.hysteresis must be non-negative".to_string(),
            ));
        }

        if self.anomaly_db.enabled && self.anomaly_db.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "anomaly_db.dir must not be empty when anomaly_db.enabled is true".to_string(),
            ));
        }
        if self.anomaly_db.max_file_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "anomaly_db.max_file_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.anomaly_db.retention_days == 0 {
            return Err(ConfigError::Validation(
                "anomaly_db.retention_days must be greater than 0".to_string(),
            ));
        }

        if self.simulation.profile.trim().is_empty() {
            return Err(ConfigError::Validation(
                "simulation.profile must not be empty".to_string(),
            ));
        }

        self.validate_servers()
    }

    fn validate_anomaly(&self) -> Result<(), ConfigError> {
        let anomaly = &self.anomaly;
        if anomaly.min_samples < 3 {
            return Err(ConfigError::Validation(
                "anomaly.min_samples must be at least 3".to_string(),
            ));
        }
        if anomaly.window_minutes == 0 || anomaly.window_minutes > MAX_ANOMALY_WINDOW_MINUTES {
            return Err(ConfigError::Validation(format!(
                "anomaly.window_minutes must be between 1 and {}",
                MAX_ANOMALY_WINDOW_MINUTES
            )));
        }
        if !anomaly.trigger_stddev.is_finite() || anomaly.trigger_stddev <= 0.0 {
            return Err(ConfigError::Validation(
                "anomaly.trigger_stddev must be a positive number".to_string(),
            ));
        }
        if !anomaly.min_stddev.is_finite() || anomaly.min_stddev <= 0.0 {
            return Err(ConfigError::Validation(
                "anomaly.min_stddev must be a positive number".to_string(),
            ));
        }

        let buckets = &anomaly.severity;
        let ordered = [
            ("anomaly.severity.low", buckets.low),
            ("anomaly.severity.medium", buckets.medium),
            ("anomaly.severity.high", buckets.high),
            ("anomaly.severity.critical", buckets.critical),
        ];
        for (name, value) in ordered {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be a positive number",
                    name
                )));
            }
        }
        if !(buckets.low <= buckets.medium
            && buckets.medium <= buckets.high
            && buckets.high <= buckets.critical)
        {
            return Err(ConfigError::Validation(
                "anomaly.severity bounds must be ordered low <= medium <= high <= critical"
                    .to_string(),
            ));
        }
        if buckets.low < anomaly.trigger_stddev {
            return Err(ConfigError::Validation(
                "anomaly.severity.low must not be below anomaly.trigger_stddev".to_string(),
            ));
        }

        for (name, ceiling) in [
            ("anomaly.ceilings.cpu", anomaly.ceilings.cpu),
            ("anomaly.ceilings.memory", anomaly.ceilings.memory),
            ("anomaly.ceilings.disk", anomaly.ceilings.disk),
            ("anomaly.ceilings.network", anomaly.ceilings.network),
        ] {
            if let Some(value) = ceiling
                && (!value.is_finite() || value <= 0.0)
            {
                return Err(ConfigError::Validation(format!(
                    "{} must be a positive number",
                    name
                )));
            }
        }

        Ok(())
    }

    fn validate_servers(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for server in &self.servers {
            if server.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "servers[].id must not be empty".to_string(),
                ));
            }
            if server.host.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "servers[{}].host must not be empty",
                    server.id
                )));
            }
            if server.port == 0 {
                return Err(ConfigError::Validation(format!(
                    "servers[{}].port must be greater than 0",
                    server.id
                )));
            }
            if !seen.insert(server.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate server id {}",
                    server.id
                )));
            }
        }
        Ok(())
    }
}

fn validate_percentage(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and 100",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::schema::Config;

    fn parse(raw: &str) -> Config {
        toml::from_str(raw).expect("config should parse")
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        let config = parse("");
        config.validate().expect("defaults should validate");
        assert_eq!(config.status.normal_threshold_secs, 60);
        assert_eq!(config.status.grace_threshold_secs, 600);
        assert_eq!(config.status.app_downtime_grace_trigger_secs, 300);
        assert_eq!(config.anomaly.min_samples, 5);
        assert_eq!(config.anomaly.ceilings.disk, Some(90.0));
    }

    #[test]
    fn rejects_unordered_severity_buckets() {
        let config = parse("[anomaly.severity]\nlow = 2.0\nmedium = 5.0\nhigh = 4.0\n");
        let error = config.validate().expect_err("should reject");
        assert!(error.to_string().contains("ordered"));
    }

    #[test]
    fn rejects_zero_stddev_floor() {
        let config = parse("[anomaly]\nmin_stddev = 0.0\n");
        let error = config.validate().expect_err("should reject");
        assert!(error.to_string().contains("anomaly.min_stddev"));
    }

    #[test]
    fn rejects_duplicate_server_ids() {
        let config = parse(
            "[[servers]]\nid = \"web-1\"\nhost = \"10.0.0.1\"\n\n[[servers]]\nid = \"web-1\"\nhost = \"10.0.0.2\"\n",
        );
        let error = config.validate().expect_err("should reject");
        assert!(error.to_string().contains("duplicate server id web-1"));
    }

    #[test]
    fn rejects_grace_below_normal_threshold() {
        let config = parse("[status]\nnormal_threshold_secs = 120\ngrace_threshold_secs = 60\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_legacy_ram_alias() {
        let config = parse("[alerts]\nram = 70.0\n");
        assert!((config.alerts.memory - 70.0).abs() < f64::EPSILON);
    }
}
