mod collect;
mod probe;
mod provider;
mod service;


pub use collect::check_fleet_metrics;
pub use probe::Prober;
pub use provider::ActiveMetricsProvider;
pub use service::MonitorCore;
