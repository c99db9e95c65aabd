mod baseline;
mod engine;
mod evaluator;
mod model;
mod registry;
mod summary;
mod window;

#[cfg(test)]
mod tests;

pub use engine::{AnomalyEngine, AnomalyPass};
pub use model::{AnomalyFeedEvent, AnomalyRecord, MetricPoint, MetricType, Severity};
pub use registry::AnomalyRegistry;
pub use summary::AnomalyStatusSummary;
