use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify, RwLock};

use crate::{
    config::{Config, RuntimeConfig},
    monitor::MonitorCore,
    status::ConnectionTracker,
};

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub config_path: String,
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub runtime_update_notify: Arc<Notify>,
    pub core: Arc<MonitorCore>,
    pub connection_tracker: Arc<ConnectionTracker>,
    pub last_monitor_tick: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppContext {
    pub fn new(config: Config, config_path: impl Into<String>, core: MonitorCore) -> Self {
        let runtime_config = RuntimeConfig::from_config(&config);
        Self {
            config,
            config_path: config_path.into(),
            runtime_config: Arc::new(RwLock::new(runtime_config)),
            runtime_update_notify: Arc::new(Notify::new()),
            core: Arc::new(core),
            connection_tracker: Arc::new(ConnectionTracker::new()),
            last_monitor_tick: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn update_runtime_config(&self, runtime_config: RuntimeConfig) {
        {
            let mut current = self.runtime_config.write().await;
            *current = runtime_config;
        }
        self.runtime_update_notify.notify_waiters();
    }
}
