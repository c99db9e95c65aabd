use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRecord {
    pub server_id: String,
    pub last_heartbeat: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
}

impl HeartbeatRecord {
    pub fn new(server_id: &str, last_heartbeat: DateTime<Utc>) -> Self {
        Self {
            server_id: server_id.to_string(),
            last_heartbeat,
            agent_version: None,
        }
    }

    #[cfg(test)]
    pub fn with_agent_version(mut self, version: impl Into<String>) -> Self {
        self.agent_version = Some(version.into());
        self
    }

    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.last_heartbeat)
            .num_seconds()
            .max(0)
    }
}
