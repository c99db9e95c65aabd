use crate::config::{AnomalySettings, SeverityBuckets};

use super::{
    baseline::{Baseline, compute_baseline},
    model::{MetricPoint, MetricType, Severity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Baseline,
    Ceiling,
    Both,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub candidate: MetricPoint,
    pub baseline: Baseline,
    /// Distance above the mean in effective standard deviations.
    pub sigma: f64,
    pub severity: Severity,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    InsufficientData { available: usize, required: usize },
    Normal { candidate: MetricPoint, baseline: Baseline },
    Anomalous(Detection),
}

/// Judges the newest sample against a baseline built from the samples
/// before it. `samples` must be the trailing window, oldest first.
pub fn assess(settings: &AnomalySettings, metric: MetricType, samples: &[MetricPoint]) -> Assessment {
    let required = required_samples(settings);
    let Some((candidate, history)) = samples.split_last() else {
        return Assessment::InsufficientData {
            available: 0,
            required,
        };
    };
    if samples.len() < required {
        return Assessment::InsufficientData {
            available: samples.len(),
            required,
        };
    }

    let history = history.iter().map(|point| point.value).collect::<Vec<_>>();
    let Some(baseline) = compute_baseline(&history) else {
        return Assessment::InsufficientData {
            available: samples.len(),
            required,
        };
    };

    let effective_stddev = baseline.stddev.max(settings.min_stddev);
    let sigma = (candidate.value - baseline.mean) / effective_stddev;

    let baseline_severity = if sigma > settings.trigger_stddev {
        severity_for_sigma(&settings.severity, sigma)
    } else {
        None
    };
    let ceiling_severity = settings
        .ceilings
        .for_metric(metric)
        .filter(|ceiling| candidate.value > *ceiling)
        .map(|ceiling| severity_for_ceiling_excess(candidate.value, ceiling));

    let (severity, trigger) = match (baseline_severity, ceiling_severity) {
        (None, None) => {
            return Assessment::Normal {
                candidate: *candidate,
                baseline,
            };
        }
        (Some(severity), None) => (severity, Trigger::Baseline),
        (None, Some(severity)) => (severity, Trigger::Ceiling),
        (Some(left), Some(right)) => (left.max(right), Trigger::Both),
    };

    Assessment::Anomalous(Detection {
        candidate: *candidate,
        baseline,
        sigma,
        severity,
        trigger,
    })
}

/// Window size needed before a stream is judged: the candidate plus at
/// least two baseline samples.
pub fn required_samples(settings: &AnomalySettings) -> usize {
    settings.min_samples.max(3)
}

/// `None` below the `low` bound: past the trigger but not worth a record.
pub fn severity_for_sigma(buckets: &SeverityBuckets, sigma: f64) -> Option<Severity> {
    if sigma >= buckets.critical {
        Some(Severity::Critical)
    } else if sigma >= buckets.high {
        Some(Severity::High)
    } else if sigma >= buckets.medium {
        Some(Severity::Medium)
    } else if sigma >= buckets.low {
        Some(Severity::Low)
    } else {
        None
    }
}

/// Severity for a value over a fixed ceiling, by relative excess.
pub fn severity_for_ceiling_excess(value: f64, ceiling: f64) -> Severity {
    let excess = (value - ceiling) / ceiling;
    if excess > 0.5 {
        Severity::Critical
    } else if excess > 0.3 {
        Severity::High
    } else if excess > 0.1 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
