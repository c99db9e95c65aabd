use chrono::Utc;
use tokio::time::{Duration, interval};

use crate::app_context::AppContext;
use crate::status::{FleetStatusSummary, ServerStatus};

pub(super) fn start_status_report_job(app_context: AppContext) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(
            app_context.config.status_report_interval,
        ));

        loop {
            ticker.tick().await;
            report_fleet_status(&app_context).await;
        }
    });
}

async fn report_fleet_status(app_context: &AppContext) {
    let runtime_config = app_context.runtime_config.read().await.clone();
    let now = Utc::now();
    let assessments = runtime_config
        .servers
        .iter()
        .map(|server| app_context.core.classify(server, now))
        .collect::<Vec<_>>();

    for assessment in assessments
        .iter()
        .filter(|assessment| assessment.status != ServerStatus::Online)
    {
        let highest_severity = app_context
            .core
            .anomaly_summary(&assessment.server_id)
            .map(|summary| summary.highest_severity.to_string())
            .unwrap_or_else(|error| format!("unavailable({})", error));
        let alerting = match app_context.core.alerting_metrics(&assessment.server_id) {
            Ok(metrics) => metrics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Err(error) => format!("unavailable({})", error),
        };
        log::warn!(
            "server_status server_id={} status={} reason={:?} anomaly_severity={} alerting=[{}]",
            assessment.server_id,
            assessment.status,
            assessment.reason,
            highest_severity,
            alerting
        );
    }

    let monitor_tick_age_secs = app_context
        .last_monitor_tick
        .lock()
        .await
        .map(|tick| now.signed_duration_since(tick).num_seconds().max(0))
        .unwrap_or(-1);

    let summary = FleetStatusSummary::from_assessments(&assessments);
    tracing::info!(
        target: "status",
        module = "status",
        total = summary.total,
        online = summary.online,
        warning = summary.warning,
        offline = summary.offline,
        no_heartbeat = summary.no_heartbeat,
        suspended = summary.suspended,
        store_unavailable = summary.store_unavailable,
        monitor_tick_age_secs,
        "fleet_status"
    );
}
