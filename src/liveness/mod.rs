mod fallback;
mod fast;

pub use fallback::FileLivenessStore;
pub use fast::MemoryLivenessStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// One tier of the app liveness marker.
pub trait LivenessStore: Send + Sync {
    fn write(&self, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Returns the stored marker, or `None` when absent or expired at `now`.
    fn read(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Records when this process last completed a liveness tick, in a fast
/// expiring tier and a durable fallback tier.
#[derive(Clone)]
pub struct AppLivenessTracker {
    fast: Arc<dyn LivenessStore>,
    fallback: Arc<dyn LivenessStore>,
}

impl AppLivenessTracker {
    pub fn new(fast: Arc<dyn LivenessStore>, fallback: Arc<dyn LivenessStore>) -> Self {
        Self { fast, fallback }
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Result<(), StoreError> {
        let fast_result = self.fast.write(now);
        if let Err(error) = &fast_result {
            log::warn!("liveness_fast_write_failed error={}", error);
        }

        self.fallback.write(now)?;
        fast_result
    }

    /// `Ok(None)` means no evidence of downtime; callers must not treat it
    /// as an outage.
    pub fn last_seen(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.fast.read(now) {
            Ok(Some(at)) => return Ok(Some(at)),
            Ok(None) => {}
            Err(error) => {
                log::warn!("liveness_fast_read_failed error={} fallback=file", error);
            }
        }

        self.fallback.read(now)
    }
}
