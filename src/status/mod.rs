mod classifier;
mod summary;
mod threshold;
mod transitions;


#[cfg(test)]
pub(crate) use classifier::StatusReason;
pub use classifier::{IncidentSource, ServerStatus, StatusAssessment, StatusClassifier};
pub use summary::FleetStatusSummary;
pub use threshold::AdaptiveThresholdResolver;
pub use transitions::{ConnectionEvent, ConnectionTracker};
