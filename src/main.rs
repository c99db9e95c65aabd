mod alerts;
mod anomaly;
mod anomaly_db;
mod app_context;
mod config;
mod error;
mod heartbeat;
mod jobs;
mod liveness;
mod monitor;
mod status;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::app_context::AppContext;
use crate::config::{Config, load_config, resolve_config_path};
use crate::heartbeat::{HeartbeatStore, MemoryHeartbeatStore, SledHeartbeatStore};
use crate::jobs::start_background_jobs;
use crate::liveness::{AppLivenessTracker, FileLivenessStore, MemoryLivenessStore};
use crate::monitor::MonitorCore;

fn init_json_logging() {
    if let Err(error) = tracing_log::LogTracer::init() {
        eprintln!(
            "logging bridge initialization failed (continuing with existing logger): {}",
            error
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", error);
    }
}

fn open_heartbeat_store(config: &Config) -> Result<Arc<dyn HeartbeatStore>, error::StoreError> {
    if !config.heartbeat_store.enabled {
        log::warn!("heartbeat_store_degraded backend=memory reason=persistence_disabled");
        return Ok(Arc::new(MemoryHeartbeatStore::new()));
    }

    let store = SledHeartbeatStore::open(&config.heartbeat_store.path)?;
    log::info!(
        "heartbeat_store_opened backend=sled path={}",
        config.heartbeat_store.path
    );
    Ok(Arc::new(store))
}

fn restore_open_anomalies(config: &Config, core: &MonitorCore) {
    let replay = match anomaly_db::replay_journal(&config.anomaly_db) {
        Ok(replay) => replay,
        Err(error) => {
            log::warn!("anomaly db: startup replay skipped: {}", error);
            return;
        }
    };

    match core.restore_anomalies(replay.unresolved, replay.last_id) {
        Ok(restored) => log::info!("anomaly_journal_replayed unresolved={}", restored),
        Err(error) => log::warn!("anomaly db: startup replay failed: {}", error),
    }
}

#[tokio::main]
async fn main() {
    init_json_logging();

    let config_path = resolve_config_path();
    let config: Config = match load_config(&config_path) {
        Ok(config) => config,
        Err(error) => {
            log::error!("Configuration error: {}", error);
            return;
        }
    };

    log::info!(
        "fleetwatch is starting... servers={} config={}",
        config.servers.len(),
        config_path
    );

    let heartbeats = match open_heartbeat_store(&config) {
        Ok(store) => store,
        Err(error) => {
            log::error!("CRITICAL: heartbeat store unavailable: {}", error);
            return;
        }
    };

    let fallback = FileLivenessStore::new(&config.liveness.fallback_path);
    log::info!(
        "liveness_store_configured fast_ttl_secs={} fallback={}",
        config.liveness.fast_ttl_secs,
        fallback.path().display()
    );
    let liveness = AppLivenessTracker::new(
        Arc::new(MemoryLivenessStore::with_ttl_secs(config.liveness.fast_ttl_secs)),
        Arc::new(fallback),
    );
    let core = MonitorCore::new(&config, heartbeats, liveness);

    match core.resolve_threshold(chrono::Utc::now()) {
        Ok(threshold_secs) => log::info!("startup_threshold threshold_secs={}", threshold_secs),
        Err(error) => log::warn!("startup_threshold_unavailable error={}", error),
    }

    restore_open_anomalies(&config, &core);

    let app_context = AppContext::new(config, config_path, core);
    let core = app_context.core.clone();
    start_background_jobs(app_context);

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown requested, exiting"),
        Err(error) => log::error!("failed to listen for shutdown signal: {}", error),
    }

    if let Err(error) = core.flush() {
        log::warn!("heartbeat_store_flush_failed error={}", error);
    }
}
