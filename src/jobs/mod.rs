use crate::app_context::AppContext;

mod anomaly;
mod config_reload;
mod monitor;
mod schedules;
mod status_report;

pub fn start_background_jobs(app_context: AppContext) {
    monitor::start_monitor_job(app_context.clone());
    anomaly::start_anomaly_job(app_context.clone());
    status_report::start_status_report_job(app_context.clone());
    config_reload::start_config_hot_reload_job(app_context.clone());
    schedules::start_maintenance_job(app_context);
}
