mod memory;
mod model;
mod persistent;

pub use memory::MemoryHeartbeatStore;
pub use model::HeartbeatRecord;
pub use persistent::SledHeartbeatStore;

use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Last-contact timestamps, one record per monitored server.
///
/// Writes are last-write-wins by `last_heartbeat`: an upsert carrying an
/// older timestamp than the stored one leaves the record untouched.
pub trait HeartbeatStore: Send + Sync {
    fn upsert(&self, record: HeartbeatRecord) -> Result<(), StoreError>;

    fn get(&self, server_id: &str) -> Result<Option<HeartbeatRecord>, StoreError>;

    fn remove(&self, server_id: &str) -> Result<bool, StoreError>;

    fn server_ids(&self) -> Result<Vec<String>, StoreError>;

    fn record(&self, server_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.upsert(HeartbeatRecord::new(server_id, at))
    }

    /// Pushes buffered writes to durable storage. No-op for volatile stores.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Folds an incoming record into the stored one. Returns `None` when the
/// stored record is newer and nothing should be written.
pub(crate) fn merge_records(
    current: Option<&HeartbeatRecord>,
    incoming: HeartbeatRecord,
) -> Option<HeartbeatRecord> {
    match current {
        None => Some(incoming),
        Some(existing) if incoming.last_heartbeat < existing.last_heartbeat => None,
        Some(existing) => Some(HeartbeatRecord {
            agent_version: incoming
                .agent_version
                .or_else(|| existing.agent_version.clone()),
            ..incoming
        }),
    }
}
