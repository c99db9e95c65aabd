use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::{
    alerts::{AlertBook, AlertNotification},
    anomaly::{
        AnomalyEngine, AnomalyPass, AnomalyRecord, AnomalyRegistry, AnomalyStatusSummary,
        MetricPoint, MetricType,
    },
    config::{Config, RuntimeConfig, ServerEntry},
    error::{CoreError, InputError, StoreError},
    heartbeat::HeartbeatStore,
    liveness::AppLivenessTracker,
    status::{AdaptiveThresholdResolver, IncidentSource, StatusAssessment, StatusClassifier},
};

/// Open anomalies plus currently-alerting fixed thresholds.
struct FleetIncidents {
    registry: Arc<AnomalyRegistry>,
    alerts: Arc<AlertBook>,
}

impl IncidentSource for FleetIncidents {
    fn unresolved_incidents(&self, server_id: &str) -> Result<usize, StoreError> {
        Ok(self.registry.unresolved_count(server_id)? + self.alerts.active_count(server_id)?)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub heartbeats_removed: usize,
    pub streams_removed: usize,
    pub alert_streams_removed: usize,
    pub anomalies_dropped: usize,
}

/// Entry point for the scheduler: probe results, liveness ticks and metric
/// samples come in; status assessments and anomaly feed events go out.
pub struct MonitorCore {
    heartbeats: Arc<dyn HeartbeatStore>,
    liveness: AppLivenessTracker,
    classifier: StatusClassifier,
    anomalies: AnomalyEngine,
    alerts: Arc<AlertBook>,
    future_tolerance_secs: u64,
}

impl MonitorCore {
    pub fn new(
        config: &Config,
        heartbeats: Arc<dyn HeartbeatStore>,
        liveness: AppLivenessTracker,
    ) -> Self {
        let registry = Arc::new(AnomalyRegistry::new());
        let alerts = Arc::new(AlertBook::new());
        let incidents = Arc::new(FleetIncidents {
            registry: Arc::clone(&registry),
            alerts: Arc::clone(&alerts),
        });
        let resolver = AdaptiveThresholdResolver::new(config.status.clone(), liveness.clone());

        Self {
            heartbeats: Arc::clone(&heartbeats),
            liveness,
            classifier: StatusClassifier::new(heartbeats, resolver, incidents),
            anomalies: AnomalyEngine::new(
                config.anomaly.clone(),
                config.status.future_tolerance_secs,
                registry,
            ),
            alerts,
            future_tolerance_secs: config.status.future_tolerance_secs,
        }
    }

    /// A failed probe leaves the heartbeat alone so it ages naturally.
    pub fn on_probe_result(
        &self,
        runtime: &RuntimeConfig,
        server_id: &str,
        success: bool,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        configured_server(runtime, server_id)?;
        if !success {
            return Ok(());
        }

        let tolerance =
            ChronoDuration::seconds(self.future_tolerance_secs.min(i64::MAX as u64 / 1000) as i64);
        if at > now + tolerance {
            return Err(InputError::FutureTimestamp {
                at,
                tolerance_secs: self.future_tolerance_secs,
            }
            .into());
        }

        self.heartbeats.record(server_id, at)?;
        Ok(())
    }

    pub fn on_tick(&self, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.liveness.tick(now)
    }

    /// Feeds the rolling window and the fixed-threshold alerts. A rejected
    /// sample touches neither.
    pub fn on_metric_sample(
        &self,
        runtime: &RuntimeConfig,
        server_id: &str,
        metric: MetricType,
        at: DateTime<Utc>,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<Option<AlertNotification>, CoreError> {
        let server = configured_server(runtime, server_id)?;
        self.anomalies
            .ingest(server_id, metric, MetricPoint::new(at, value), now)?;
        Ok(self
            .alerts
            .observe(server, metric, value, &runtime.alerts, now)?)
    }

    pub fn classify(&self, server: &ServerEntry, now: DateTime<Utc>) -> StatusAssessment {
        self.classifier
            .classify(&server.id, server.monitoring_suspended, now)
    }

    pub fn resolve_threshold(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.classifier.resolver().resolve_threshold(now)
    }

    pub fn run_anomaly_pass(&self, now: DateTime<Utc>) -> Result<AnomalyPass, StoreError> {
        self.anomalies.evaluate_all(now)
    }

    pub fn anomaly_summary(&self, server_id: &str) -> Result<AnomalyStatusSummary, StoreError> {
        let records = self.anomalies.registry().unresolved_for(server_id)?;
        Ok(AnomalyStatusSummary::from_records(server_id, &records))
    }

    /// Re-seeds open anomalies after a restart. New ids continue after
    /// `last_id`, the largest id the journal ever recorded.
    pub fn restore_anomalies(
        &self,
        records: impl IntoIterator<Item = AnomalyRecord>,
        last_id: u64,
    ) -> Result<usize, StoreError> {
        let registry = self.anomalies.registry();
        registry.continue_ids_after(last_id);
        registry.restore(records)
    }

    pub fn alerting_metrics(&self, server_id: &str) -> Result<Vec<MetricType>, StoreError> {
        self.alerts.alerting_metrics(server_id)
    }

    pub fn forget_alerts(&self, server_id: &str) -> Result<(), StoreError> {
        self.alerts.forget_server(server_id)
    }

    /// Drops every piece of state kept for servers that left the config.
    pub fn prune_unconfigured(&self, configured: &[String]) -> Result<PruneReport, StoreError> {
        let mut report = PruneReport::default();
        for server_id in self.heartbeats.server_ids()? {
            if !configured.contains(&server_id) && self.heartbeats.remove(&server_id)? {
                report.heartbeats_removed += 1;
            }
        }
        report.streams_removed = self.anomalies.retain_servers(configured)?;
        report.alert_streams_removed = self.alerts.retain_servers(configured)?;
        report.anomalies_dropped = self.anomalies.registry().retain_servers(configured)?.len();
        Ok(report)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.heartbeats.flush()
    }
}

fn configured_server<'a>(
    runtime: &'a RuntimeConfig,
    server_id: &str,
) -> Result<&'a ServerEntry, InputError> {
    runtime.server(server_id).ok_or_else(|| InputError::UnknownServer {
        server_id: server_id.to_string(),
    })
}
