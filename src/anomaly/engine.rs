use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::{
    config::AnomalySettings,
    error::{CoreError, StoreError},
};

use super::{
    evaluator::{Assessment, assess},
    model::{AnomalyFeedEvent, AnomalyRecord, MetricPoint, MetricType},
    registry::AnomalyRegistry,
    window::SampleWindow,
};

const STORE_NAME: &str = "sample_windows";

type StreamKey = (String, MetricType);

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    InsufficientData { available: usize, required: usize },
    Normal { resolved: Vec<AnomalyRecord> },
    Created(AnomalyRecord),
    /// Still anomalous; an unresolved record inside the window already covers it.
    Ongoing(AnomalyRecord),
}

impl EvaluationOutcome {
    pub fn feed_events(&self) -> Vec<AnomalyFeedEvent> {
        match self {
            EvaluationOutcome::Created(record) => vec![AnomalyFeedEvent::Created(record.clone())],
            EvaluationOutcome::Normal { resolved } => resolved
                .iter()
                .cloned()
                .map(AnomalyFeedEvent::Resolved)
                .collect(),
            EvaluationOutcome::InsufficientData { .. } | EvaluationOutcome::Ongoing(_) => Vec::new(),
        }
    }
}

/// Result of one pass. `evaluated` and `insufficient` count samples.
#[derive(Debug, Default)]
pub struct AnomalyPass {
    pub events: Vec<AnomalyFeedEvent>,
    pub evaluated: usize,
    pub insufficient: usize,
    pub failed: usize,
}

/// Rolling windows per (server, metric) plus the unresolved-record ledger.
/// Evaluation of one stream holds that stream's lock from assessment to
/// ledger update, so the same stream never produces duplicate records and
/// no sample is judged twice.
pub struct AnomalyEngine {
    settings: AnomalySettings,
    future_tolerance_secs: u64,
    streams: RwLock<HashMap<StreamKey, Arc<Mutex<SampleWindow>>>>,
    registry: Arc<AnomalyRegistry>,
}

impl AnomalyEngine {
    pub fn new(
        settings: AnomalySettings,
        future_tolerance_secs: u64,
        registry: Arc<AnomalyRegistry>,
    ) -> Self {
        Self {
            settings,
            future_tolerance_secs,
            streams: RwLock::new(HashMap::new()),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<AnomalyRegistry> {
        &self.registry
    }

    pub fn ingest(
        &self,
        server_id: &str,
        metric: MetricType,
        point: MetricPoint,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let stream = self.stream(server_id, metric)?;
        let mut window = stream
            .lock()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "stream lock poisoned"))?;
        window.push(point, now, self.future_tolerance_secs)?;
        Ok(())
    }

    /// Judges every sample that arrived since the stream was last
    /// evaluated, oldest first, each against the samples held before it.
    /// One outcome per judged sample; empty when nothing new arrived.
    pub fn evaluate(
        &self,
        server_id: &str,
        metric: MetricType,
        now: DateTime<Utc>,
    ) -> Result<Vec<EvaluationOutcome>, CoreError> {
        let Some(stream) = self.existing_stream(server_id, metric)? else {
            return Ok(Vec::new());
        };
        let mut window = stream
            .lock()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "stream lock poisoned"))?;
        window.evict_before(now - self.window_span());

        let (samples, first_unjudged) = window.unjudged();
        let mut outcomes = Vec::with_capacity(samples.len() - first_unjudged);
        for idx in first_unjudged..samples.len() {
            outcomes.push(self.apply(server_id, metric, &samples[..=idx])?);
        }
        window.mark_judged();
        Ok(outcomes)
    }

    /// One pass over every known stream. A failing stream is logged and
    /// skipped; the others are still evaluated.
    pub fn evaluate_all(&self, now: DateTime<Utc>) -> Result<AnomalyPass, StoreError> {
        let mut keys = self
            .streams
            .read()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();

        let mut pass = AnomalyPass::default();
        for (server_id, metric) in keys {
            let outcomes = match self.evaluate(&server_id, metric, now) {
                Ok(outcomes) => outcomes,
                Err(error) => {
                    pass.failed += 1;
                    log::warn!(
                        "anomaly_evaluation_failed server_id={} metric={} error={}",
                        server_id,
                        metric,
                        error
                    );
                    continue;
                }
            };

            for outcome in outcomes {
                match outcome {
                    EvaluationOutcome::InsufficientData {
                        available,
                        required,
                    } => {
                        pass.insufficient += 1;
                        log::debug!(
                            "anomaly_insufficient_data server_id={} metric={} available={} required={}",
                            server_id,
                            metric,
                            available,
                            required
                        );
                    }
                    outcome => {
                        pass.evaluated += 1;
                        pass.events.extend(outcome.feed_events());
                    }
                }
            }
        }

        Ok(pass)
    }

    /// Forgets windows of servers that are no longer configured.
    pub fn retain_servers(&self, server_ids: &[String]) -> Result<usize, StoreError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;
        let before = streams.len();
        streams.retain(|(server, _), _| server_ids.contains(server));
        Ok(before - streams.len())
    }

    fn apply(
        &self,
        server_id: &str,
        metric: MetricType,
        samples: &[MetricPoint],
    ) -> Result<EvaluationOutcome, CoreError> {
        match assess(&self.settings, metric, samples) {
            Assessment::InsufficientData {
                available,
                required,
            } => Ok(EvaluationOutcome::InsufficientData {
                available,
                required,
            }),
            Assessment::Normal { candidate, .. } => {
                let resolved = self.registry.resolve_stream(server_id, metric, candidate.at)?;
                Ok(EvaluationOutcome::Normal { resolved })
            }
            Assessment::Anomalous(detection) => {
                let since = detection.candidate.at - self.window_span();
                if let Some(existing) = self.registry.open_since(server_id, metric, since)? {
                    return Ok(EvaluationOutcome::Ongoing(existing));
                }

                let record = self.registry.create(server_id, metric, &detection)?;
                log::info!(
                    "anomaly_detected server_id={} metric={} severity={} value={:.2} mean={:.2} stddev={:.2} sigma={:.2}",
                    server_id,
                    metric,
                    record.severity,
                    record.metric_value,
                    record.baseline_mean,
                    record.baseline_stddev,
                    detection.sigma
                );
                Ok(EvaluationOutcome::Created(record))
            }
        }
    }

    fn window_span(&self) -> ChronoDuration {
        ChronoDuration::minutes(self.settings.window_minutes.min(i64::MAX as u64 / 60_000) as i64)
    }

    fn existing_stream(
        &self,
        server_id: &str,
        metric: MetricType,
    ) -> Result<Option<Arc<Mutex<SampleWindow>>>, StoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;
        Ok(streams.get(&(server_id.to_string(), metric)).cloned())
    }

    fn stream(
        &self,
        server_id: &str,
        metric: MetricType,
    ) -> Result<Arc<Mutex<SampleWindow>>, StoreError> {
        if let Some(stream) = self.existing_stream(server_id, metric)? {
            return Ok(stream);
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| StoreError::unavailable(STORE_NAME, "lock poisoned"))?;
        Ok(streams
            .entry((server_id.to_string(), metric))
            .or_insert_with(|| {
                Arc::new(Mutex::new(SampleWindow::with_span_minutes(
                    self.settings.window_minutes,
                )))
            })
            .clone())
    }
}
