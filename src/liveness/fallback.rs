use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

use super::LivenessStore;

const STORE_NAME: &str = "liveness_fallback";

#[derive(Debug, Serialize, Deserialize)]
struct MarkerFile {
    last_seen: DateTime<Utc>,
    pid: u32,
}

/// Durable marker file. Never expires; survives process restarts.
#[derive(Debug, Clone)]
pub struct FileLivenessStore {
    path: PathBuf,
}

impl FileLivenessStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LivenessStore for FileLivenessStore {
    fn write(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| StoreError::unavailable(STORE_NAME, error))?;
        }

        let payload = serde_json::to_vec(&MarkerFile {
            last_seen: at,
            pid: std::process::id(),
        })
        .map_err(|error| StoreError::unavailable(STORE_NAME, error))?;

        // Rename keeps readers from ever seeing a half-written marker.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, payload).map_err(|error| StoreError::unavailable(STORE_NAME, error))?;
        fs::rename(&staging, &self.path).map_err(|error| StoreError::unavailable(STORE_NAME, error))
    }

    fn read(&self, _now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(StoreError::unavailable(STORE_NAME, error)),
        };

        let marker = serde_json::from_slice::<MarkerFile>(&raw).map_err(|error| {
            StoreError::unavailable(
                STORE_NAME,
                format!("unreadable marker {}: {}", self.path.display(), error),
            )
        })?;
        Ok(Some(marker.last_seen))
    }
}
