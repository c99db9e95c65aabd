use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Utc};

use crate::error::StoreError;

use super::{
    evaluator::Detection,
    model::{AnomalyRecord, MetricType},
};

const STORE_NAME: &str = "anomaly_registry";

type StreamKey = (String, MetricType);

/// Ledger of unresolved anomaly records, partitioned by (server, metric).
/// Resolved records leave the ledger; the journal keeps the history.
#[derive(Debug)]
pub struct AnomalyRegistry {
    next_id: AtomicU64,
    open: RwLock<HashMap<StreamKey, Vec<AnomalyRecord>>>,
}

impl Default for AnomalyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            open: RwLock::new(HashMap::new()),
        }
    }

    /// Newest unresolved record for the stream detected at or after `since`.
    pub fn open_since(
        &self,
        server_id: &str,
        metric: MetricType,
        since: DateTime<Utc>,
    ) -> Result<Option<AnomalyRecord>, StoreError> {
        let open = self.read()?;
        Ok(open
            .get(&(server_id.to_string(), metric))
            .and_then(|records| {
                records
                    .iter()
                    .filter(|record| record.detected_at >= since)
                    .max_by_key(|record| record.detected_at)
            })
            .cloned())
    }

    pub fn create(
        &self,
        server_id: &str,
        metric: MetricType,
        detection: &Detection,
    ) -> Result<AnomalyRecord, StoreError> {
        let record = AnomalyRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            server_id: server_id.to_string(),
            metric_type: metric,
            severity: detection.severity,
            detected_at: detection.candidate.at,
            resolved: false,
            resolved_at: None,
            metric_value: detection.candidate.value,
            baseline_mean: detection.baseline.mean,
            baseline_stddev: detection.baseline.stddev,
        };

        self.write()?
            .entry((server_id.to_string(), metric))
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Marks every unresolved record of the stream resolved and returns them.
    pub fn resolve_stream(
        &self,
        server_id: &str,
        metric: MetricType,
        at: DateTime<Utc>,
    ) -> Result<Vec<AnomalyRecord>, StoreError> {
        let Some(records) = self.write()?.remove(&(server_id.to_string(), metric)) else {
            return Ok(Vec::new());
        };

        Ok(records
            .into_iter()
            .map(|record| mark_resolved(record, at))
            .collect())
    }

    pub fn unresolved_count(&self, server_id: &str) -> Result<usize, StoreError> {
        let open = self.read()?;
        Ok(open
            .iter()
            .filter(|((server, _), _)| server == server_id)
            .map(|(_, records)| records.len())
            .sum())
    }

    pub fn unresolved_for(&self, server_id: &str) -> Result<Vec<AnomalyRecord>, StoreError> {
        let open = self.read()?;
        let mut records = open
            .iter()
            .filter(|((server, _), _)| server == server_id)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect::<Vec<_>>();
        records.sort_by_key(|record| (record.detected_at, record.id));
        Ok(records)
    }

    /// Re-seeds the ledger with records replayed from the journal. Ids
    /// continue after the largest id seen.
    pub fn restore(&self, records: impl IntoIterator<Item = AnomalyRecord>) -> Result<usize, StoreError> {
        let mut open = self.write()?;
        let mut restored = 0;
        for record in records {
            self.next_id.fetch_max(record.id.saturating_add(1), Ordering::Relaxed);
            if record.resolved {
                continue;
            }
            let stream = open
                .entry((record.server_id.clone(), record.metric_type))
                .or_default();
            if stream.iter().any(|existing| existing.id == record.id) {
                continue;
            }
            stream.push(record);
            restored += 1;
        }
        Ok(restored)
    }

    /// Ids handed out from now on continue after `last_id`, even when no
    /// record carrying it is still open.
    pub fn continue_ids_after(&self, last_id: u64) {
        self.next_id
            .fetch_max(last_id.saturating_add(1), Ordering::Relaxed);
    }

    /// Drops unresolved records of servers that are no longer configured.
    pub fn retain_servers(&self, server_ids: &[String]) -> Result<Vec<AnomalyRecord>, StoreError> {
        let mut open = self.write()?;
        let orphaned = open
            .keys()
            .filter(|(server, _)| !server_ids.contains(server))
            .cloned()
            .collect::<Vec<_>>();

        Ok(orphaned
            .into_iter()
            .filter_map(|key| open.remove(&key))
            .flatten()
            .collect())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<StreamKey, Vec<AnomalyRecord>>>, StoreError> {
        self.open
            .read()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<StreamKey, Vec<AnomalyRecord>>>, StoreError> {
        self.open
            .write()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))
    }
}

fn mark_resolved(mut record: AnomalyRecord, at: DateTime<Utc>) -> AnomalyRecord {
    record.resolved = true;
    record.resolved_at = Some(at);
    record
}
