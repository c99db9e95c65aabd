use std::fs;
use std::path::Path;

use chrono::{Duration as ChronoDuration, NaiveDate};

use crate::config::AnomalyDb;

use super::paths::{EVENTS_PREFIX, ensure_events_dir};

/// Removes journal files older than the retention window. Returns the
/// number of files removed.
pub fn run_maintenance(settings: &AnomalyDb, today: NaiveDate) -> usize {
    if !settings.enabled {
        return 0;
    }

    let dir = match ensure_events_dir(settings) {
        Ok(dir) => dir,
        Err(error) => {
            log::warn!("anomaly db maintenance: failed to ensure dirs: {}", error);
            return 0;
        }
    };

    prune_directory_by_date_prefix(&dir, EVENTS_PREFIX, settings.retention_days, today)
}

fn prune_directory_by_date_prefix(
    dir: &Path,
    prefix: &str,
    retention_days: u16,
    today: NaiveDate,
) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let keep_for = ChronoDuration::days(retention_days as i64);
    let mut removed = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if !file_name.starts_with(prefix) || !file_name.contains(".jsonl") {
            continue;
        }

        let Some(date_part) = file_name
            .strip_prefix(prefix)
            .and_then(|tail| tail.get(0..10))
        else {
            continue;
        };

        let Ok(file_date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") else {
            continue;
        };

        if today.signed_duration_since(file_date) > keep_for {
            if let Err(error) = fs::remove_file(&path) {
                log::warn!(
                    "anomaly db: failed to remove old file {}: {}",
                    path.display(),
                    error
                );
            } else {
                log::info!(
                    "anomaly db maintenance: removed old file {}",
                    path.display()
                );
                removed += 1;
            }
        }
    }

    removed
}
