use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::error::StoreError;

use super::LivenessStore;

#[derive(Debug, Clone, Copy)]
struct Marker {
    at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// In-process marker with a bounded expiry. Lost on restart.
#[derive(Debug)]
pub struct MemoryLivenessStore {
    ttl: ChronoDuration,
    marker: Mutex<Option<Marker>>,
}

impl MemoryLivenessStore {
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self {
            ttl: ChronoDuration::seconds(ttl_secs.min(i64::MAX as u64 / 1000) as i64),
            marker: Mutex::new(None),
        }
    }
}

impl LivenessStore for MemoryLivenessStore {
    fn write(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut marker = self
            .marker
            .lock()
            .map_err(|_| StoreError::unavailable("liveness_fast", "lock poisoned"))?;
        *marker = Some(Marker {
            at,
            expires_at: at + self.ttl,
        });
        Ok(())
    }

    fn read(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError> {
        let marker = self
            .marker
            .lock()
            .map_err(|_| StoreError::unavailable("liveness_fast", "lock poisoned"))?;

        Ok(marker
            .filter(|marker| now <= marker.expires_at)
            .map(|marker| marker.at))
    }
}
