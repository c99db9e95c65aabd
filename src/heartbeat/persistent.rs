use std::path::Path;

use crate::error::StoreError;

use super::{HeartbeatRecord, HeartbeatStore, merge_records};

const STORE_NAME: &str = "heartbeat";
const TREE_NAME: &str = "heartbeats";

#[derive(Clone)]
pub struct SledHeartbeatStore {
    heartbeats: sled::Tree,
}

impl SledHeartbeatStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(unavailable)?;
        Self::from_db(&db)
    }

    pub fn from_db(db: &sled::Db) -> Result<Self, StoreError> {
        let heartbeats = db.open_tree(TREE_NAME).map_err(unavailable)?;
        Ok(Self { heartbeats })
    }
}

fn unavailable(error: sled::Error) -> StoreError {
    StoreError::unavailable(STORE_NAME, error)
}

fn decode(bytes: &[u8]) -> Option<HeartbeatRecord> {
    serde_json::from_slice::<HeartbeatRecord>(bytes).ok()
}

impl HeartbeatStore for SledHeartbeatStore {
    fn upsert(&self, record: HeartbeatRecord) -> Result<(), StoreError> {
        let key = record.server_id.clone();
        self.heartbeats
            .fetch_and_update(key.as_bytes(), |current| {
                let existing = current.and_then(decode);
                match merge_records(existing.as_ref(), record.clone()) {
                    Some(merged) => serde_json::to_vec(&merged)
                        .ok()
                        .or_else(|| current.map(|bytes| bytes.to_vec())),
                    None => current.map(|bytes| bytes.to_vec()),
                }
            })
            .map_err(unavailable)?;
        Ok(())
    }

    fn get(&self, server_id: &str) -> Result<Option<HeartbeatRecord>, StoreError> {
        let Some(value) = self.heartbeats.get(server_id.as_bytes()).map_err(unavailable)? else {
            return Ok(None);
        };

        match decode(&value) {
            Some(record) => Ok(Some(record)),
            None => Err(StoreError::unavailable(
                STORE_NAME,
                format!("corrupt record for server {}", server_id),
            )),
        }
    }

    fn remove(&self, server_id: &str) -> Result<bool, StoreError> {
        let removed = self
            .heartbeats
            .remove(server_id.as_bytes())
            .map_err(unavailable)?;
        Ok(removed.is_some())
    }

    fn server_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for key in self.heartbeats.iter().keys() {
            let key = key.map_err(unavailable)?;
            if let Ok(id) = String::from_utf8(key.to_vec()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.heartbeats.flush().map_err(unavailable)?;
        Ok(())
    }
}
