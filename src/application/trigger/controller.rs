//! Update trigger controller.
//!
//! Decides, once per poll, whether a refresh should run and why. Priority:
//! manual override, performance degradation, new data, scheduled. A global
//! debounce suppresses everything but manual overrides; the staleness
//! ceiling is checked first and forces a scheduled run through the debounce.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::domain::performance::PerformanceRecord;
use crate::domain::trigger::TriggerKind;

use super::degradation::DegradationDetector;

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerPolicy {
    pub scheduled_interval: Duration,
    pub debounce: Duration,
    pub staleness_ceiling: Duration,
    /// ROI drop below baseline, in percentage points, that counts as degradation.
    pub degradation_points: f64,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            scheduled_interval: Duration::minutes(15),
            debounce: Duration::minutes(5),
            staleness_ceiling: Duration::hours(4),
            degradation_points: 15.0,
        }
    }
}

/// What the controller knows at one poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerInputs<'a> {
    pub manual_override: bool,
    /// Newest observation in the performance store.
    pub latest_observation: Option<DateTime<Utc>>,
    /// Fresh rows, read only when new data exists.
    pub fresh_records: Option<&'a [PerformanceRecord]>,
}

#[derive(Debug, Clone)]
pub struct UpdateTriggerController {
    policy: TriggerPolicy,
    detector: DegradationDetector,
    last_fired: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    watermark: Option<DateTime<Utc>>,
}

impl UpdateTriggerController {
    #[must_use]
    pub fn new(policy: TriggerPolicy) -> Self {
        let detector = DegradationDetector::new(policy.degradation_points);
        Self {
            policy,
            detector,
            last_fired: None,
            last_success: None,
            watermark: None,
        }
    }

    /// Return `true` if the store holds rows newer than the last refresh saw.
    #[must_use]
    pub fn has_new_data(&self, latest_observation: Option<DateTime<Utc>>) -> bool {
        match (latest_observation, self.watermark) {
            (Some(latest), Some(mark)) => latest > mark,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Decide whether to refresh now.
    #[must_use]
    pub fn decide(&self, inputs: TriggerInputs<'_>, now: DateTime<Utc>) -> Option<TriggerKind> {
        if inputs.manual_override {
            return Some(TriggerKind::ManualOverride);
        }

        let stale = self
            .last_success
            .map_or(true, |at| now - at >= self.policy.staleness_ceiling);
        if stale {
            debug!("Staleness ceiling reached");
            return Some(TriggerKind::Scheduled);
        }

        let since_fired = self.last_fired.map(|at| now - at);
        if since_fired.is_some_and(|elapsed| elapsed < self.policy.debounce) {
            return None;
        }

        if let Some(records) = inputs.fresh_records {
            let degraded = self.detector.detect(records);
            if let Some(worst) = degraded.first() {
                info!(
                    strategy = %worst.strategy_id,
                    baseline = worst.baseline_roi,
                    current = worst.current_roi,
                    affected = degraded.len(),
                    "Performance degradation detected"
                );
                return Some(TriggerKind::PerformanceDegradation);
            }
        }

        if self.has_new_data(inputs.latest_observation) {
            return Some(TriggerKind::NewData);
        }

        if since_fired.map_or(true, |elapsed| elapsed >= self.policy.scheduled_interval) {
            return Some(TriggerKind::Scheduled);
        }

        None
    }

    /// Note that a refresh was attempted, successful or not.
    pub fn record_attempt(&mut self, now: DateTime<Utc>) {
        self.last_fired = Some(now);
    }

    /// Note a successful refresh: advance the watermark and recapture
    /// degradation baselines from the records it used.
    pub fn record_success(
        &mut self,
        now: DateTime<Utc>,
        watermark: Option<DateTime<Utc>>,
        records: &[PerformanceRecord],
    ) {
        self.last_fired = Some(now);
        self.last_success = Some(now);
        if watermark.is_some() {
            self.watermark = watermark;
        }
        if !records.is_empty() {
            self.detector.capture(records);
        }
    }
}
