use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use file_rotate::{ContentLimit, FileRotate, compression::Compression, suffix::AppendCount};

use crate::anomaly::AnomalyFeedEvent;
use crate::config::AnomalyDb;

use super::model::{JournalEntry, JournalError};
use super::paths::{daily_file, ensure_events_dir};

/// Appends feed events to today's journal file. Returns how many were written.
pub fn append_events(
    settings: &AnomalyDb,
    events: &[AnomalyFeedEvent],
    now: DateTime<Utc>,
) -> Result<usize, JournalError> {
    if !settings.enabled || events.is_empty() {
        return Ok(0);
    }

    let dir = ensure_events_dir(settings)?;
    let path = daily_file(&dir, now);
    let entries = events
        .iter()
        .cloned()
        .map(|event| JournalEntry {
            recorded_at: now,
            event,
        })
        .collect::<Vec<_>>();

    append_with_rotation(
        &path,
        &entries,
        settings.max_file_size_bytes,
        settings.retention_days,
    )?;
    Ok(entries.len())
}

fn append_with_rotation(
    path: &Path,
    entries: &[JournalEntry],
    max_file_size_bytes: u64,
    retention_days: u16,
) -> Result<(), JournalError> {
    let max_bytes = usize::try_from(max_file_size_bytes).unwrap_or(usize::MAX);
    let mut writer = FileRotate::new(
        path,
        AppendCount::new((retention_days as usize).max(1)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );

    for entry in entries {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        writer.write_all(&line)?;
    }
    writer.flush()?;
    Ok(())
}
