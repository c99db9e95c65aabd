use chrono::Utc;
use tokio::time::{Duration, interval};

use crate::anomaly_db::run_maintenance;
use crate::app_context::AppContext;

pub(super) fn start_maintenance_job(app_context: AppContext) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(3600));

        loop {
            ticker.tick().await;
            run_hourly_maintenance(&app_context).await;
        }
    });
}

async fn run_hourly_maintenance(app_context: &AppContext) {
    let removed_files = run_maintenance(&app_context.config.anomaly_db, Utc::now().date_naive());

    let configured = app_context
        .runtime_config
        .read()
        .await
        .servers
        .iter()
        .map(|server| server.id.clone())
        .collect::<Vec<_>>();

    match app_context.core.prune_unconfigured(&configured) {
        Ok(report) => log::info!(
            "maintenance_completed journal_files_removed={} heartbeats_removed={} streams_removed={} alert_streams_removed={} anomalies_dropped={}",
            removed_files,
            report.heartbeats_removed,
            report.streams_removed,
            report.alert_streams_removed,
            report.anomalies_dropped
        ),
        Err(error) => log::warn!("maintenance_prune_failed error={}", error),
    }
}
