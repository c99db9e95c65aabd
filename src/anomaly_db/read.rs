use std::collections::BTreeMap;
use std::fs;

use crate::anomaly::{AnomalyFeedEvent, AnomalyRecord};
use crate::config::AnomalyDb;

use super::model::{JournalEntry, JournalError};
use super::paths::{events_dir, journal_files};

/// Every readable journal entry, oldest first. Lines that do not parse are
/// skipped and counted in the log.
pub fn read_entries(settings: &AnomalyDb) -> Result<Vec<JournalEntry>, JournalError> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for path in journal_files(&events_dir(settings)) {
        let content = fs::read_to_string(&path)?;
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str::<JournalEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(_) => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        log::warn!("anomaly db: skipped unreadable journal lines count={}", skipped);
    }

    entries.sort_by_key(|entry| entry.recorded_at);
    Ok(entries)
}

/// What a restart needs from the journal: records created and never
/// resolved, and the largest record id ever written.
#[derive(Debug, Default)]
pub struct JournalReplay {
    pub unresolved: Vec<AnomalyRecord>,
    pub last_id: u64,
}

pub fn replay_journal(settings: &AnomalyDb) -> Result<JournalReplay, JournalError> {
    if !settings.enabled {
        return Ok(JournalReplay::default());
    }

    let mut open = BTreeMap::new();
    let mut last_id = 0;
    for entry in read_entries(settings)? {
        last_id = last_id.max(entry.event.record().id);
        match entry.event {
            AnomalyFeedEvent::Created(record) => {
                open.insert(record.id, record);
            }
            AnomalyFeedEvent::Resolved(record) => {
                open.remove(&record.id);
            }
        }
    }

    Ok(JournalReplay {
        unresolved: open.into_values().collect(),
        last_id,
    })
}
