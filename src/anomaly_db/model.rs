use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anomaly::AnomalyFeedEvent;

/// One line of an `events-YYYY-MM-DD.jsonl` file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JournalEntry {
    pub recorded_at: DateTime<Utc>,
    pub event: AnomalyFeedEvent,
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("anomaly journal io: {0}")]
    Io(#[from] std::io::Error),
    #[error("anomaly journal encode: {0}")]
    Encode(#[from] serde_json::Error),
}
