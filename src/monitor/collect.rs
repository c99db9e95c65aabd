use chrono::Utc;

use crate::{alerts::AlertNotification, anomaly::MetricType, config::RuntimeConfig};

use super::{provider::MetricsProvider, service::MonitorCore};

/// Collects metrics for every active server and feeds them to the core.
/// Returns the fixed-threshold alert notifications raised on the way.
pub async fn check_fleet_metrics<P: MetricsProvider>(
    core: &MonitorCore,
    runtime_config: &RuntimeConfig,
    provider: &mut P,
) -> Vec<AlertNotification> {
    let mut notifications = Vec::new();

    for server in runtime_config
        .servers
        .iter()
        .filter(|server| !server.monitoring_suspended)
    {
        let metrics = match provider.collect_metrics(server).await {
            Ok(Some(metrics)) => metrics,
            Ok(None) => continue,
            Err(error) => {
                log::warn!(
                    "monitoring provider error server_id={} error={}",
                    server.id,
                    error
                );
                continue;
            }
        };

        let alerts = &runtime_config.alerts;
        tracing::info!(
            target: "monitor",
            module = "monitor",
            server_id = %server.id,
            cpu = metrics.cpu,
            memory = metrics.memory,
            disk = metrics.disk,
            network_kib = metrics.network,
            cpu_over = metrics.cpu > alerts.cpu,
            memory_over = metrics.memory > alerts.memory,
            disk_over = metrics.disk > alerts.disk,
            "monitor_metrics"
        );

        let at = Utc::now();
        for metric in MetricType::ALL {
            let outcome = core.on_metric_sample(
                runtime_config,
                &server.id,
                metric,
                at,
                metrics.value(metric),
                Utc::now(),
            );
            match outcome {
                Ok(Some(notification)) => notifications.push(notification),
                Ok(None) => {}
                Err(error) => log::warn!(
                    "metric_sample_rejected server_id={} metric={} error={}",
                    server.id,
                    metric,
                    error
                ),
            }
        }
    }

    notifications
}
