use chrono::Utc;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::anomaly::{AnomalyFeedEvent, Severity};
use crate::anomaly_db::append_events;
use crate::app_context::AppContext;

pub(super) fn start_anomaly_job(app_context: AppContext) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(app_context.config.anomaly_interval));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; there is nothing to evaluate yet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_anomaly_pass(&app_context);
        }
    });
}

fn run_anomaly_pass(app_context: &AppContext) {
    let now = Utc::now();
    let pass = match app_context.core.run_anomaly_pass(now) {
        Ok(pass) => pass,
        Err(error) => {
            log::error!("anomaly_pass_failed error={}", error);
            return;
        }
    };

    for event in &pass.events {
        let record = event.record();
        let level = match event {
            AnomalyFeedEvent::Created(_) if record.severity >= Severity::High => log::Level::Warn,
            _ => log::Level::Info,
        };
        log::log!(
            level,
            "anomaly_feed event={} id={} server_id={} metric={} severity={} value={:.2}",
            event.kind(),
            record.id,
            record.server_id,
            record.metric_type,
            record.severity,
            record.metric_value
        );
    }

    if let Err(error) = append_events(&app_context.config.anomaly_db, &pass.events, now) {
        log::warn!("anomaly db: failed to write event lines: {}", error);
    }

    tracing::info!(
        target: "anomaly",
        module = "anomaly",
        evaluated = pass.evaluated,
        insufficient = pass.insufficient,
        failed = pass.failed,
        events = pass.events.len(),
        "anomaly_pass"
    );
}
