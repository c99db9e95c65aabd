use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use crate::{
    anomaly::MetricType,
    config::{Alerts, ServerEntry},
    error::StoreError,
};

mod logic;


pub use logic::AlertTransition;
use logic::StreamAlertState;

const STORE_NAME: &str = "alert_book";

#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotification {
    pub server_id: String,
    pub metric: MetricType,
    pub value: f64,
    pub threshold: f64,
    pub transition: AlertTransition,
    pub at: DateTime<Utc>,
}

impl AlertNotification {
    pub fn message(&self) -> String {
        match self.transition {
            AlertTransition::Raised | AlertTransition::Repeated => format!(
                "ALERT: {} {} usage is high ({:.1}% > {:.1}%)",
                self.server_id, self.metric, self.value, self.threshold
            ),
            AlertTransition::Cleared => format!(
                "RESOLVED: {} {} usage back to {:.1}%",
                self.server_id, self.metric, self.value
            ),
        }
    }
}

/// Fixed-threshold alert state per (server, metric). A stream that is
/// currently alerting counts as one unresolved alert for its server.
#[derive(Debug, Default)]
pub struct AlertBook {
    streams: Mutex<HashMap<(String, MetricType), StreamAlertState>>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the stream's alert state. A server with `alert_suppressed`
    /// still tracks state, so it keeps counting as alerting, but never
    /// produces a notification.
    pub fn observe(
        &self,
        server: &ServerEntry,
        metric: MetricType,
        value: f64,
        alerts: &Alerts,
        now: DateTime<Utc>,
    ) -> Result<Option<AlertNotification>, StoreError> {
        let Some(threshold) = alerts.threshold_for(metric) else {
            return Ok(None);
        };

        let mut streams = self.lock()?;
        let state = streams.entry((server.id.clone(), metric)).or_default();
        let transition = state.observe(value, threshold, alerts.cooldown_secs, alerts.hysteresis, now);

        if server.alert_suppressed {
            if let Some(transition) = transition {
                log::debug!(
                    "alert_suppressed server_id={} metric={} transition={:?} value={:.1}",
                    server.id,
                    metric,
                    transition,
                    value
                );
            }
            return Ok(None);
        }

        Ok(transition.map(|transition| AlertNotification {
            server_id: server.id.clone(),
            metric,
            value,
            threshold,
            transition,
            at: now,
        }))
    }

    pub fn active_count(&self, server_id: &str) -> Result<usize, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|((server, _), state)| server == server_id && state.alerting)
            .count())
    }

    pub fn alerting_metrics(&self, server_id: &str) -> Result<Vec<MetricType>, StoreError> {
        let mut metrics = self
            .lock()?
            .iter()
            .filter(|((server, _), state)| server == server_id && state.alerting)
            .map(|((_, metric), _)| *metric)
            .collect::<Vec<_>>();
        metrics.sort();
        Ok(metrics)
    }

    pub fn forget_server(&self, server_id: &str) -> Result<(), StoreError> {
        self.lock()?.retain(|(server, _), _| server != server_id);
        Ok(())
    }

    pub fn retain_servers(&self, server_ids: &[String]) -> Result<usize, StoreError> {
        let mut streams = self.lock()?;
        let before = streams.len();
        streams.retain(|(server, _), _| server_ids.contains(server));
        Ok(before - streams.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<(String, MetricType), StreamAlertState>>, StoreError> {
        self.streams
            .lock()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))
    }
}
