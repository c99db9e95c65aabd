use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{AnomalyRecord, MetricType, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricState {
    Normal,
    Anomaly,
}

/// Per-server view of the unresolved anomaly ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyStatusSummary {
    pub server_id: String,
    pub active: usize,
    pub highest_severity: Severity,
    pub metrics: BTreeMap<MetricType, MetricState>,
}

impl AnomalyStatusSummary {
    pub fn from_records(server_id: &str, records: &[AnomalyRecord]) -> Self {
        let unresolved = records
            .iter()
            .filter(|record| record.server_id == server_id && !record.resolved)
            .collect::<Vec<_>>();

        let metrics = MetricType::ALL
            .into_iter()
            .map(|metric| {
                let state = if unresolved.iter().any(|record| record.metric_type == metric) {
                    MetricState::Anomaly
                } else {
                    MetricState::Normal
                };
                (metric, state)
            })
            .collect();

        Self {
            server_id: server_id.to_string(),
            active: unresolved.len(),
            highest_severity: unresolved
                .iter()
                .map(|record| record.severity)
                .max()
                .unwrap_or(Severity::Ok),
            metrics,
        }
    }
}
