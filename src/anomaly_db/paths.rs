use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};

use crate::config::AnomalyDb;

pub(crate) const EVENTS_PREFIX: &str = "events-";

pub(crate) fn events_dir(settings: &AnomalyDb) -> PathBuf {
    PathBuf::from(&settings.dir).join("events")
}

pub(crate) fn ensure_events_dir(settings: &AnomalyDb) -> Result<PathBuf, std::io::Error> {
    let dir = events_dir(settings);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub(crate) fn daily_file(dir: &Path, day: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "{}{:04}-{:02}-{:02}.jsonl",
        EVENTS_PREFIX,
        day.year(),
        day.month(),
        day.day()
    ))
}

/// Journal files, live and rotated, in `dir`.
pub(crate) fn journal_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(EVENTS_PREFIX) && name.contains(".jsonl"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    files.sort();
    files
}
