use std::collections::VecDeque;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::error::InputError;

use super::model::MetricPoint;

/// Rolling samples of one (server, metric) stream, oldest first. The newest
/// `pending` samples have not been judged yet. Every held sample lies inside
/// the lookback of every later one, since eviction runs from the newest.
#[derive(Debug)]
pub struct SampleWindow {
    samples: VecDeque<MetricPoint>,
    span: ChronoDuration,
    pending: usize,
}

impl SampleWindow {
    pub fn with_span_minutes(minutes: u64) -> Self {
        Self {
            samples: VecDeque::new(),
            span: ChronoDuration::minutes(minutes.min(i64::MAX as u64 / 60_000) as i64),
            pending: 0,
        }
    }

    /// Validates and appends a sample, then evicts everything older than
    /// the lookback measured from the new sample. A rejected sample leaves
    /// the window untouched.
    pub fn push(
        &mut self,
        point: MetricPoint,
        now: DateTime<Utc>,
        future_tolerance_secs: u64,
    ) -> Result<(), InputError> {
        validate_point(point, now, future_tolerance_secs)?;

        if let Some(newest) = self.samples.back()
            && point.at < newest.at
        {
            return Err(InputError::OutOfOrder {
                at: point.at,
                newest: newest.at,
            });
        }

        self.samples.push_back(point);
        self.pending += 1;
        self.evict_before(point.at - self.span);
        Ok(())
    }

    pub fn evict_before(&mut self, cutoff: DateTime<Utc>) {
        while self
            .samples
            .front()
            .is_some_and(|sample| sample.at < cutoff)
        {
            self.samples.pop_front();
        }
        self.pending = self.pending.min(self.samples.len());
    }

    /// Every held sample oldest first, and the index of the first one not
    /// yet judged.
    pub fn unjudged(&self) -> (Vec<MetricPoint>, usize) {
        let samples = self.samples.iter().copied().collect::<Vec<_>>();
        let first = samples.len() - self.pending;
        (samples, first)
    }

    pub fn mark_judged(&mut self) {
        self.pending = 0;
    }
}

pub fn validate_point(
    point: MetricPoint,
    now: DateTime<Utc>,
    future_tolerance_secs: u64,
) -> Result<(), InputError> {
    if !point.value.is_finite() {
        return Err(InputError::NonFiniteValue { value: point.value });
    }
    if point.value < 0.0 {
        return Err(InputError::NegativeValue { value: point.value });
    }

    let tolerance = ChronoDuration::seconds(future_tolerance_secs.min(i64::MAX as u64 / 1000) as i64);
    if point.at > now + tolerance {
        return Err(InputError::FutureTimestamp {
            at: point.at,
            tolerance_secs: future_tolerance_secs,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{MetricPoint, SampleWindow};
    use crate::error::InputError;

    #[test]
    fn evicts_samples_older_than_lookback() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut window = SampleWindow::with_span_minutes(30);

        for minute in [0, 10, 20, 35, 45] {
            let at = start + Duration::minutes(minute);
            window
                .push(MetricPoint::new(at, minute as f64), at, 5)
                .expect("valid sample");
        }

        let (kept, _) = window.unjudged();
        assert_eq!(
            kept.iter().map(|point| point.value).collect::<Vec<_>>(),
            vec![20.0, 35.0, 45.0]
        );
    }

    #[test]
    fn rejected_samples_do_not_touch_the_window() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut window = SampleWindow::with_span_minutes(30);
        window
            .push(MetricPoint::new(now, 40.0), now, 5)
            .expect("valid sample");

        let cases = [
            MetricPoint::new(now, f64::NAN),
            MetricPoint::new(now, -1.0),
            MetricPoint::new(now + Duration::seconds(60), 10.0),
            MetricPoint::new(now - Duration::seconds(30), 10.0),
        ];
        for point in cases {
            assert!(window.push(point, now, 5).is_err());
        }

        let (held, first_unjudged) = window.unjudged();
        assert_eq!(held.len(), 1);
        assert_eq!(first_unjudged, 0);
    }

    #[test]
    fn out_of_order_names_the_newest_sample() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut window = SampleWindow::with_span_minutes(30);
        window.push(MetricPoint::new(now, 1.0), now, 5).expect("valid");

        let error = window
            .push(MetricPoint::new(now - Duration::seconds(1), 1.0), now, 5)
            .expect_err("older sample rejected");
        assert_eq!(
            error,
            InputError::OutOfOrder {
                at: now - Duration::seconds(1),
                newest: now,
            }
        );
    }

    #[test]
    fn small_clock_skew_is_tolerated() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut window = SampleWindow::with_span_minutes(30);
        window
            .push(MetricPoint::new(now + Duration::seconds(3), 1.0), now, 5)
            .expect("within tolerance");
    }

    #[test]
    fn judged_samples_stay_judged_across_eviction() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut window = SampleWindow::with_span_minutes(30);
        for minute in [0, 10, 20] {
            let at = start + Duration::minutes(minute);
            window.push(MetricPoint::new(at, 1.0), at, 5).expect("valid");
        }
        window.mark_judged();

        for minute in [35, 45] {
            let at = start + Duration::minutes(minute);
            window.push(MetricPoint::new(at, 2.0), at, 5).expect("valid");
        }

        let (held, first_unjudged) = window.unjudged();
        assert_eq!(held.len(), 3);
        assert_eq!(first_unjudged, 1);
        assert_eq!(held[first_unjudged].at, start + Duration::minutes(35));
    }
}
