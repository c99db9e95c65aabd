use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use crate::error::StoreError;

use super::classifier::{ServerStatus, StatusAssessment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    WentOffline { server_id: String, at: DateTime<Utc> },
    CameBack { server_id: String, at: DateTime<Utc> },
}

/// Remembers the last reachability seen per server and reports real changes.
/// The first observation of a server only seeds the state.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    reachable: Mutex<HashMap<String, bool>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, assessment: &StatusAssessment) -> Result<Option<ConnectionEvent>, StoreError> {
        self.observe_status(&assessment.server_id, assessment.status, assessment.assessed_at)
    }

    pub fn observe_status(
        &self,
        server_id: &str,
        status: ServerStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<ConnectionEvent>, StoreError> {
        let reachable = status.is_reachable();
        let previous = self.lock()?.insert(server_id.to_string(), reachable);

        Ok(match previous {
            Some(true) if !reachable => Some(ConnectionEvent::WentOffline {
                server_id: server_id.to_string(),
                at,
            }),
            Some(false) if reachable => Some(ConnectionEvent::CameBack {
                server_id: server_id.to_string(),
                at,
            }),
            _ => None,
        })
    }

    /// Suspended servers are forgotten so resuming them never fires a
    /// transition.
    pub fn clear(&self, server_id: &str) -> Result<(), StoreError> {
        self.lock()?.remove(server_id);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, bool>>, StoreError> {
        self.reachable
            .lock()
            .map_err(|_| StoreError::unavailable("connection_tracker", "lock poisoned"))
    }
}
