mod defaults;
mod io;
mod schema;
mod validate;

pub use io::{load_config, resolve_config_path};
#[allow(unused_imports)]
pub use schema::{
    AbsoluteCeilings, Alerts, AnomalyDb, AnomalySettings, Config, HeartbeatStoreConfig, Liveness,
    RuntimeConfig, ServerEntry, ServerKind, SeverityBuckets, Simulation, StatusSettings,
};
