use serde::Serialize;

use super::classifier::{ServerStatus, StatusAssessment, StatusReason};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetStatusSummary {
    pub total: usize,
    pub online: usize,
    pub warning: usize,
    pub offline: usize,
    pub no_heartbeat: usize,
    pub suspended: usize,
    pub store_unavailable: usize,
}

impl FleetStatusSummary {
    pub fn from_assessments<'a>(assessments: impl IntoIterator<Item = &'a StatusAssessment>) -> Self {
        let mut summary = Self::default();
        for assessment in assessments {
            summary.total += 1;
            match assessment.status {
                ServerStatus::Online => summary.online += 1,
                ServerStatus::Warning => summary.warning += 1,
                ServerStatus::Offline => summary.offline += 1,
            }
            match assessment.reason {
                StatusReason::NoHeartbeat => summary.no_heartbeat += 1,
                StatusReason::Suspended => summary.suspended += 1,
                StatusReason::StoreUnavailable { .. } => summary.store_unavailable += 1,
                _ => {}
            }
        }
        summary
    }
}
