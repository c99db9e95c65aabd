use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;

use super::{HeartbeatRecord, HeartbeatStore, merge_records};

const STORE_NAME: &str = "heartbeat";

#[derive(Debug, Default)]
pub struct MemoryHeartbeatStore {
    records: RwLock<HashMap<String, HeartbeatRecord>>,
}

impl MemoryHeartbeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeartbeatStore for MemoryHeartbeatStore {
    fn upsert(&self, record: HeartbeatRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;

        if let Some(merged) = merge_records(records.get(&record.server_id), record) {
            records.insert(merged.server_id.clone(), merged);
        }
        Ok(())
    }

    fn get(&self, server_id: &str) -> Result<Option<HeartbeatRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;
        Ok(records.get(server_id).cloned())
    }

    fn remove(&self, server_id: &str) -> Result<bool, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;
        Ok(records.remove(server_id).is_some())
    }

    fn server_ids(&self) -> Result<Vec<String>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;
        let mut ids = records.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        Ok(ids)
    }
}
