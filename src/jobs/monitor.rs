use chrono::Utc;
use tokio::time::{Duration, sleep};

use crate::alerts::AlertTransition;
use crate::app_context::AppContext;
use crate::config::RuntimeConfig;
use crate::monitor::{ActiveMetricsProvider, Prober, check_fleet_metrics};
use crate::status::ConnectionEvent;

pub(super) fn start_monitor_job(app_context: AppContext) {
    tokio::spawn(async move {
        let simulation = &app_context.config.simulation;
        let mut metrics_provider = ActiveMetricsProvider::new(simulation.enabled);
        let mut prober = Prober::new(simulation.enabled, app_context.config.probe_timeout_secs);
        if simulation.enabled {
            log::warn!(
                "simulation_mode_enabled profile={} source=monitor_provider",
                simulation.profile
            );
        }
        let mut previous_tick = None;

        loop {
            let runtime_config = app_context.runtime_config.read().await.clone();
            let now = Utc::now();

            if let Some(previous) = previous_tick {
                let elapsed_secs = now.signed_duration_since(previous).num_seconds().max(0);
                let threshold_secs = (runtime_config.monitor_interval * 2) as i64;
                if elapsed_secs > threshold_secs {
                    log::warn!(
                        "monitor_loop_delayed elapsed_secs={} threshold_secs={}",
                        elapsed_secs,
                        threshold_secs
                    );
                }
            }

            previous_tick = Some(now);

            {
                let mut tick = app_context.last_monitor_tick.lock().await;
                *tick = Some(now);
            }

            record_probe_results(&app_context, &runtime_config, &mut prober).await;

            let notifications =
                check_fleet_metrics(&app_context.core, &runtime_config, &mut metrics_provider).await;
            for notification in notifications {
                match notification.transition {
                    AlertTransition::Cleared => log::info!("{}", notification.message()),
                    AlertTransition::Raised | AlertTransition::Repeated => {
                        log::warn!("{}", notification.message())
                    }
                }
            }

            track_connection_changes(&app_context, &runtime_config);

            // Must run after classification: this round still sees the app's own downtime.
            if let Err(error) = app_context.core.on_tick(Utc::now()) {
                log::error!("liveness_tick_failed error={}", error);
            }

            let sleep_duration = Duration::from_secs(runtime_config.monitor_interval);
            tokio::select! {
                _ = sleep(sleep_duration) => {}
                _ = app_context.runtime_update_notify.notified() => {
                    log::info!(
                        "monitor_interval_change_interrupt_applied previous_sleep_secs={}",
                        runtime_config.monitor_interval
                    );
                }
            }
        }
    });
}

async fn record_probe_results(
    app_context: &AppContext,
    runtime_config: &RuntimeConfig,
    prober: &mut Prober,
) {
    let outcomes = prober.probe_all(&runtime_config.servers).await;
    let reachable = outcomes.iter().filter(|outcome| outcome.success).count();

    for outcome in &outcomes {
        if let Some(error) = &outcome.error {
            log::warn!(
                "heartbeat_probe_failed server_id={} error={}",
                outcome.server_id,
                error
            );
        }

        if let Err(error) = app_context.core.on_probe_result(
            runtime_config,
            &outcome.server_id,
            outcome.success,
            outcome.at,
            Utc::now(),
        ) {
            log::error!(
                "heartbeat_record_failed server_id={} error={}",
                outcome.server_id,
                error
            );
        }
    }

    tracing::info!(
        target: "monitor",
        module = "heartbeat",
        probed = outcomes.len(),
        reachable,
        unreachable = outcomes.len() - reachable,
        "heartbeat_probe_round"
    );
}

fn track_connection_changes(app_context: &AppContext, runtime_config: &RuntimeConfig) {
    let now = Utc::now();
    for server in &runtime_config.servers {
        if server.monitoring_suspended {
            if let Err(error) = app_context.connection_tracker.clear(&server.id) {
                log::warn!("connection_tracker_failed server_id={} error={}", server.id, error);
            }
            if let Err(error) = app_context.core.forget_alerts(&server.id) {
                log::warn!("alert_state_clear_failed server_id={} error={}", server.id, error);
            }
            continue;
        }

        let assessment = app_context.core.classify(server, now);
        match app_context.connection_tracker.observe(&assessment) {
            Ok(Some(ConnectionEvent::WentOffline { server_id, .. })) => {
                log::warn!(
                    "server_went_offline server_id={} reason={:?}",
                    server_id,
                    assessment.reason
                );
            }
            Ok(Some(ConnectionEvent::CameBack { server_id, .. })) => {
                log::info!(
                    "server_came_back server_id={} status={}",
                    server_id,
                    assessment.status
                );
            }
            Ok(None) => {}
            Err(error) => {
                log::warn!("connection_tracker_failed server_id={} error={}", server.id, error);
            }
        }
    }
}
