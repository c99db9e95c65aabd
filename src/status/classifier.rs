use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::StoreError,
    heartbeat::HeartbeatStore,
};

use super::threshold::AdaptiveThresholdResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerStatus {
    Online,
    Warning,
    Offline,
}

impl ServerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Online => "ONLINE",
            ServerStatus::Warning => "WARNING",
            ServerStatus::Offline => "OFFLINE",
        }
    }

    /// Reachable as far as connection tracking is concerned.
    pub fn is_reachable(self) -> bool {
        !matches!(self, ServerStatus::Offline)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusReason {
    Suspended,
    NoHeartbeat,
    Stale { age_secs: u64, threshold_secs: u64 },
    UnresolvedIncidents { count: usize },
    Healthy { age_secs: u64, threshold_secs: u64 },
    StoreUnavailable { detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusAssessment {
    pub server_id: String,
    pub status: ServerStatus,
    pub reason: StatusReason,
    pub assessed_at: DateTime<Utc>,
}

/// Anything that can tell whether a server has open anomalies or alerts.
pub trait IncidentSource: Send + Sync {
    fn unresolved_incidents(&self, server_id: &str) -> Result<usize, StoreError>;
}

/// Inputs the rule table decides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusFacts {
    pub suspended: bool,
    pub heartbeat_age_secs: Option<u64>,
    pub threshold_secs: u64,
    pub unresolved_incidents: usize,
}

type Rule = fn(&StatusFacts) -> Option<(ServerStatus, StatusReason)>;

/// Highest priority first; the first rule that matches decides.
/// Staleness sits above incidents, so an old heartbeat is OFFLINE whatever
/// the incident count.
const RULES: [(&str, Rule); 4] = [
    ("suspended", suspended_rule),
    ("no_heartbeat", no_heartbeat_rule),
    ("stale", stale_rule),
    ("incidents", incidents_rule),
];

fn suspended_rule(facts: &StatusFacts) -> Option<(ServerStatus, StatusReason)> {
    facts
        .suspended
        .then_some((ServerStatus::Offline, StatusReason::Suspended))
}

fn no_heartbeat_rule(facts: &StatusFacts) -> Option<(ServerStatus, StatusReason)> {
    facts
        .heartbeat_age_secs
        .is_none()
        .then_some((ServerStatus::Offline, StatusReason::NoHeartbeat))
}

fn stale_rule(facts: &StatusFacts) -> Option<(ServerStatus, StatusReason)> {
    let age_secs = facts.heartbeat_age_secs?;
    is_stale(age_secs, facts.threshold_secs).then_some((
        ServerStatus::Offline,
        StatusReason::Stale {
            age_secs,
            threshold_secs: facts.threshold_secs,
        },
    ))
}

fn incidents_rule(facts: &StatusFacts) -> Option<(ServerStatus, StatusReason)> {
    (facts.unresolved_incidents > 0).then_some((
        ServerStatus::Warning,
        StatusReason::UnresolvedIncidents {
            count: facts.unresolved_incidents,
        },
    ))
}

/// A heartbeat exactly `threshold` seconds old is still fresh.
pub fn is_stale(age_secs: u64, threshold_secs: u64) -> bool {
    age_secs > threshold_secs
}

pub fn decide(facts: &StatusFacts) -> (ServerStatus, StatusReason) {
    RULES
        .iter()
        .find_map(|(name, rule)| {
            rule(facts).inspect(|_| log::trace!("status_rule_matched rule={}", name))
        })
        .unwrap_or((
            ServerStatus::Online,
            StatusReason::Healthy {
                age_secs: facts.heartbeat_age_secs.unwrap_or_default(),
                threshold_secs: facts.threshold_secs,
            },
        ))
}

#[derive(Clone)]
pub struct StatusClassifier {
    heartbeats: Arc<dyn HeartbeatStore>,
    resolver: AdaptiveThresholdResolver,
    incidents: Arc<dyn IncidentSource>,
}

impl StatusClassifier {
    pub fn new(
        heartbeats: Arc<dyn HeartbeatStore>,
        resolver: AdaptiveThresholdResolver,
        incidents: Arc<dyn IncidentSource>,
    ) -> Self {
        Self {
            heartbeats,
            resolver,
            incidents,
        }
    }

    /// Read-only; calling it twice with unchanged stores yields the same
    /// assessment. Store failures fail closed to OFFLINE.
    pub fn classify(&self, server_id: &str, suspended: bool, now: DateTime<Utc>) -> StatusAssessment {
        let (status, reason) = match self.gather(server_id, suspended, now) {
            Ok(facts) => decide(&facts),
            Err(error) => {
                log::warn!(
                    "status_store_unavailable server_id={} error={}",
                    server_id,
                    error
                );
                (
                    ServerStatus::Offline,
                    StatusReason::StoreUnavailable {
                        detail: error.to_string(),
                    },
                )
            }
        };

        StatusAssessment {
            server_id: server_id.to_string(),
            status,
            reason,
            assessed_at: now,
        }
    }

    pub fn resolver(&self) -> &AdaptiveThresholdResolver {
        &self.resolver
    }

    fn gather(
        &self,
        server_id: &str,
        suspended: bool,
        now: DateTime<Utc>,
    ) -> Result<StatusFacts, StoreError> {
        if suspended {
            return Ok(StatusFacts {
                suspended,
                heartbeat_age_secs: None,
                threshold_secs: 0,
                unresolved_incidents: 0,
            });
        }

        let heartbeat_age_secs = self
            .heartbeats
            .get(server_id)?
            .map(|record| record.age_secs(now) as u64);
        let threshold_secs = self.resolver.resolve_threshold(now)?;
        let unresolved_incidents = self.incidents.unresolved_incidents(server_id)?;

        Ok(StatusFacts {
            suspended,
            heartbeat_age_secs,
            threshold_secs,
            unresolved_incidents,
        })
    }
}
