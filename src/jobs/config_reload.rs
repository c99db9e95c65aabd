use std::path::{Path, PathBuf};

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::app_context::AppContext;
use crate::config::{RuntimeConfig, load_config};

/// Server-list changes between two runtime configs.
#[derive(Debug, Default, PartialEq, Eq)]
struct FleetChanges {
    added: Vec<String>,
    removed: Vec<String>,
    suspended: Vec<String>,
    resumed: Vec<String>,
}

impl FleetChanges {
    fn between(previous: &RuntimeConfig, next: &RuntimeConfig) -> Self {
        let mut changes = Self::default();
        for server in &next.servers {
            match previous.server(&server.id) {
                None => changes.added.push(server.id.clone()),
                Some(before) if !before.monitoring_suspended && server.monitoring_suspended => {
                    changes.suspended.push(server.id.clone())
                }
                Some(before) if before.monitoring_suspended && !server.monitoring_suspended => {
                    changes.resumed.push(server.id.clone())
                }
                Some(_) => {}
            }
        }
        changes.removed = previous
            .servers
            .iter()
            .filter(|server| next.server(&server.id).is_none())
            .map(|server| server.id.clone())
            .collect();
        changes
    }
}

#[derive(Debug)]
struct AppliedReload {
    runtime_config: RuntimeConfig,
    changes: FleetChanges,
}

async fn apply_runtime_reload_from_path(
    app_context: &AppContext,
    config_path: &str,
) -> Result<AppliedReload, String> {
    let new_config = load_config(config_path).map_err(|error| error.to_string())?;
    let runtime_config = RuntimeConfig::from_config(&new_config);
    let previous = app_context.runtime_config.read().await.clone();
    let changes = FleetChanges::between(&previous, &runtime_config);
    app_context.update_runtime_config(runtime_config.clone()).await;
    Ok(AppliedReload {
        runtime_config,
        changes,
    })
}

/// Editors often replace the file instead of writing in place, so the
/// parent directory is watched and events are matched by file name.
fn touches_config(event: &Event, config_file: &Path) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    );
    relevant_kind
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == config_file.file_name())
}

fn watch_target(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub(super) fn start_config_hot_reload_job(app_context: AppContext) {
    tokio::spawn(async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let config_path = app_context.config_path.clone();
        let config_file = PathBuf::from(&config_path);
        let mut watcher = match RecommendedWatcher::new(
            move |result| {
                let _ = tx.send(result);
            },
            NotifyConfig::default(),
        ) {
            Ok(watcher) => watcher,
            Err(error) => {
                log::warn!("config hot-reload disabled: watcher init failed: {}", error);
                return;
            }
        };

        let target = watch_target(&config_file);
        if let Err(error) = watcher.watch(&target, RecursiveMode::NonRecursive) {
            log::warn!(
                "config hot-reload disabled: failed to watch {}: {}",
                target.display(),
                error
            );
            return;
        }

        while let Some(event_result) = rx.recv().await {
            let event = match event_result {
                Ok(event) => event,
                Err(error) => {
                    log::warn!("config hot-reload event error: {}", error);
                    continue;
                }
            };

            if !touches_config(&event, &config_file) {
                continue;
            }

            match apply_runtime_reload_from_path(&app_context, config_path.as_str()).await {
                Ok(AppliedReload {
                    runtime_config,
                    changes,
                }) => {
                    log::info!(
                        "config_hot_reload_applied target=runtime monitor_interval={} servers={} added={:?} removed={:?} suspended={:?} resumed={:?}",
                        runtime_config.monitor_interval,
                        runtime_config.servers.len(),
                        changes.added,
                        changes.removed,
                        changes.suspended,
                        changes.resumed,
                    );
                    for server_id in &changes.removed {
                        if let Err(error) = app_context.connection_tracker.clear(server_id) {
                            log::warn!(
                                "connection_tracker_failed server_id={} error={}",
                                server_id,
                                error
                            );
                        }
                    }
                }
                Err(error) => {
                    log::warn!("config hot-reload ignored invalid config: {}", error);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests;
