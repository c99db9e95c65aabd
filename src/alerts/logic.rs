use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    Raised,
    Repeated,
    Cleared,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StreamAlertState {
    pub(crate) alerting: bool,
    pub(crate) last_sent: Option<DateTime<Utc>>,
}

impl StreamAlertState {
    /// Raises above `threshold`, clears at or below `threshold - hysteresis`,
    /// and repeats while alerting once `cooldown_secs` has passed.
    pub(crate) fn observe(
        &mut self,
        value: f64,
        threshold: f64,
        cooldown_secs: u64,
        hysteresis: f64,
        now: DateTime<Utc>,
    ) -> Option<AlertTransition> {
        if !self.alerting && value > threshold {
            self.alerting = true;
            self.last_sent = Some(now);
            return Some(AlertTransition::Raised);
        }

        let clear_threshold = (threshold - hysteresis).max(0.0);
        if self.alerting && value <= clear_threshold {
            self.alerting = false;
            return Some(AlertTransition::Cleared);
        }

        if self.alerting
            && let Some(last) = self.last_sent
            && (now - last).num_seconds() >= cooldown_secs.min(i64::MAX as u64) as i64
        {
            self.last_sent = Some(now);
            return Some(AlertTransition::Repeated);
        }

        None
    }
}
