use chrono::{DateTime, Utc};

use crate::{config::StatusSettings, error::StoreError, liveness::AppLivenessTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdDecision {
    pub threshold_secs: u64,
    /// Seconds since the app's last liveness marker; `None` when unknown.
    pub app_downtime_secs: Option<u64>,
    pub grace: bool,
}

/// Picks the heartbeat staleness allowance. Right after the monitoring app
/// itself was down longer than the grace trigger, the wider grace threshold
/// applies so servers are not flagged offline for the app's own outage.
#[derive(Clone)]
pub struct AdaptiveThresholdResolver {
    settings: StatusSettings,
    liveness: AppLivenessTracker,
}

impl AdaptiveThresholdResolver {
    pub fn new(settings: StatusSettings, liveness: AppLivenessTracker) -> Self {
        Self { settings, liveness }
    }

    pub fn resolve_threshold(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.decide(now)?.threshold_secs)
    }

    pub fn decide(&self, now: DateTime<Utc>) -> Result<ThresholdDecision, StoreError> {
        let last_seen = self.liveness.last_seen(now)?;
        Ok(decide_threshold(&self.settings, last_seen, now))
    }
}

pub fn decide_threshold(
    settings: &StatusSettings,
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ThresholdDecision {
    let app_downtime_secs =
        last_seen.map(|at| now.signed_duration_since(at).num_seconds().max(0) as u64);
    let grace = app_downtime_secs
        .is_some_and(|downtime| downtime > settings.app_downtime_grace_trigger_secs);

    ThresholdDecision {
        threshold_secs: if grace {
            settings.grace_threshold_secs
        } else {
            settings.normal_threshold_secs
        },
        app_downtime_secs,
        grace,
    }
}
