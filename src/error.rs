use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("{store} store unavailable: {reason}")]
    Unavailable { store: &'static str, reason: String },
}

impl StoreError {
    pub fn unavailable(store: &'static str, reason: impl ToString) -> Self {
        Self::Unavailable {
            store,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("metric value must be finite, got {value}")]
    NonFiniteValue { value: f64 },
    #[error("metric value must be non-negative, got {value}")]
    NegativeValue { value: f64 },
    #[error("timestamp {at} is more than {tolerance_secs}s ahead of now")]
    FutureTimestamp {
        at: DateTime<Utc>,
        tolerance_secs: u64,
    },
    #[error("timestamp {at} is older than the newest sample {newest}")]
    OutOfOrder {
        at: DateTime<Utc>,
        newest: DateTime<Utc>,
    },
    #[error("server {server_id} is not configured")]
    UnknownServer { server_id: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
}
