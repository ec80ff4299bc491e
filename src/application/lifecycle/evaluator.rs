//! Lifecycle evaluation.
//!
//! [`LifecycleEvaluator::evaluate`] is a pure function of
//! (record, current status, age). [`LifecycleEvaluator::resolve`] layers the
//! upgrade hysteresis on top, using the registry entry's onboarding flag and
//! clearance timestamp.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::domain::lifecycle::{LifecycleStatus, TransitionReason};
use crate::domain::performance::PerformanceRecord;
use crate::domain::strategy::StrategyEntry;

/// Thresholds for the transition rules.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleThresholds {
    /// Below this sample size the status is left unchanged.
    pub min_samples: u32,
    /// ROI below this quarantines regardless of win rate.
    pub hard_roi_floor: f64,
    pub probation_roi: f64,
    pub probation_win_rate: f64,
    pub consecutive_loss_threshold: u32,
    /// Default onboarding grace period for newly registered strategies.
    pub grace_days: i64,
    /// Sample size that lifts the grace cap early.
    pub robust_sample_size: u32,
    /// How long an upgrade candidate must hold before it applies.
    pub evaluation_window: Duration,
}

impl Default for LifecycleThresholds {
    fn default() -> Self {
        Self {
            min_samples: 5,
            hard_roi_floor: -10.0,
            probation_roi: -5.0,
            probation_win_rate: 0.45,
            consecutive_loss_threshold: 8,
            grace_days: 7,
            robust_sample_size: 50,
            evaluation_window: Duration::hours(24),
        }
    }
}

/// Result of evaluating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Status the evaluator applies directly: a downgrade or no change.
    pub status: LifecycleStatus,
    /// What the rules say the status should be, after the grace cap.
    pub candidate: LifecycleStatus,
    pub reason: TransitionReason,
}

impl Assessment {
    const fn unchanged(current: LifecycleStatus, reason: TransitionReason) -> Self {
        Self {
            status: current,
            candidate: current,
            reason,
        }
    }

    /// Return `true` if the candidate is better than the applied status.
    #[must_use]
    pub const fn is_upgrade_held(&self) -> bool {
        self.status.is_worse_than(self.candidate)
    }
}

/// Outcome of [`LifecycleEvaluator::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub previous: LifecycleStatus,
    pub status: LifecycleStatus,
    pub reason: TransitionReason,
}

impl Resolution {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.status
    }
}

#[derive(Debug, Clone, Default)]
pub struct LifecycleEvaluator {
    thresholds: LifecycleThresholds,
}

impl LifecycleEvaluator {
    #[must_use]
    pub const fn new(thresholds: LifecycleThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub const fn thresholds(&self) -> &LifecycleThresholds {
        &self.thresholds
    }

    /// Evaluate a record against the transition rules using the default
    /// grace period.
    #[must_use]
    pub fn evaluate(
        &self,
        record: &PerformanceRecord,
        current: LifecycleStatus,
        age_days: i64,
    ) -> Assessment {
        self.evaluate_with_grace(record, current, age_days, self.thresholds.grace_days)
    }

    /// Evaluate with an explicit grace period (cold-start strategies get a
    /// longer one).
    #[must_use]
    pub fn evaluate_with_grace(
        &self,
        record: &PerformanceRecord,
        current: LifecycleStatus,
        age_days: i64,
        grace_days: i64,
    ) -> Assessment {
        if current == LifecycleStatus::Deprecated {
            return Assessment::unchanged(current, TransitionReason::Retired);
        }

        if let Err(detail) = record.validate() {
            warn!(
                strategy = %record.strategy_id,
                detail = %detail,
                "Malformed performance record, status unchanged"
            );
            return Assessment::unchanged(current, TransitionReason::MalformedRecord { detail });
        }

        let t = &self.thresholds;
        if record.sample_size < t.min_samples {
            return Assessment::unchanged(
                current,
                TransitionReason::InsufficientSamples {
                    sample_size: record.sample_size,
                    required: t.min_samples,
                },
            );
        }

        let (mut candidate, mut reason) = self.classify(record);

        if candidate == LifecycleStatus::Active
            && age_days < grace_days
            && record.sample_size < t.robust_sample_size
        {
            candidate = LifecycleStatus::Probation;
            reason = TransitionReason::GracePeriod {
                age_days,
                grace_days,
            };
        }

        if current.is_worse_than(candidate) {
            return Assessment {
                status: current,
                candidate,
                reason: TransitionReason::AwaitingClearance { candidate },
            };
        }

        Assessment {
            status: candidate,
            candidate,
            reason,
        }
    }

    /// Apply the rule chain (first match wins). Assumes a valid record with
    /// enough samples.
    fn classify(&self, record: &PerformanceRecord) -> (LifecycleStatus, TransitionReason) {
        let t = &self.thresholds;
        let (win_rate, roi) = (record.win_rate, record.roi);

        if roi < t.hard_roi_floor {
            return (
                LifecycleStatus::Quarantine,
                TransitionReason::RoiBelowFloor {
                    roi,
                    floor: t.hard_roi_floor,
                },
            );
        }
        if win_rate < 0.50 && roi < 0.0 {
            return (
                LifecycleStatus::Quarantine,
                TransitionReason::LosingRecord { win_rate, roi },
            );
        }
        if win_rate < 0.55 && roi < -5.0 {
            return (
                LifecycleStatus::Quarantine,
                TransitionReason::WeakAndLosing { win_rate, roi },
            );
        }
        if self.is_below_probation(record) {
            return (
                LifecycleStatus::Probation,
                TransitionReason::BelowProbation { win_rate, roi },
            );
        }
        if record.consecutive_losses >= t.consecutive_loss_threshold {
            return (
                LifecycleStatus::CircuitBreakerOpen,
                TransitionReason::ConsecutiveLosses {
                    count: record.consecutive_losses,
                    threshold: t.consecutive_loss_threshold,
                },
            );
        }
        (LifecycleStatus::Active, TransitionReason::Healthy)
    }

    /// Return `true` if the record sits below the probation ROI or win rate.
    #[must_use]
    pub fn is_below_probation(&self, record: &PerformanceRecord) -> bool {
        record.roi < self.thresholds.probation_roi
            || record.win_rate < self.thresholds.probation_win_rate
    }

    /// Evaluate and apply upgrade hysteresis, updating `entry` in place.
    ///
    /// Upgrades apply immediately only for a strategy graduating out of
    /// onboarding probation; otherwise the candidate must stay better than
    /// the current status for a full evaluation window.
    pub fn resolve(
        &self,
        entry: &mut StrategyEntry,
        record: &PerformanceRecord,
        now: DateTime<Utc>,
    ) -> Resolution {
        let previous = entry.status;
        let assessment =
            self.evaluate_with_grace(record, previous, entry.age_days(now), entry.grace_days);
        entry.counters.evaluations += 1;

        let (status, reason) = if assessment.is_upgrade_held() {
            self.clear_upgrade(entry, &assessment, now)
        } else {
            entry.cleared_since = None;
            (assessment.status, assessment.reason)
        };

        if status != previous {
            entry.status = status;
            entry.counters.transitions += 1;
            if status == LifecycleStatus::Active {
                entry.onboarding = false;
            }
        }

        let below_probation = record.validate().is_ok() && self.is_below_probation(record);
        if status == LifecycleStatus::Active && below_probation {
            entry.counters.cycles_below_probation += 1;
        } else {
            entry.counters.cycles_below_probation = 0;
        }

        Resolution {
            previous,
            status,
            reason,
        }
    }

    fn clear_upgrade(
        &self,
        entry: &mut StrategyEntry,
        assessment: &Assessment,
        now: DateTime<Utc>,
    ) -> (LifecycleStatus, TransitionReason) {
        let candidate = assessment.candidate;

        if entry.onboarding
            && entry.status == LifecycleStatus::Probation
            && candidate == LifecycleStatus::Active
        {
            entry.cleared_since = None;
            return (candidate, TransitionReason::Graduated);
        }

        let since = *entry.cleared_since.get_or_insert(now);
        let window = self.thresholds.evaluation_window;
        if now - since >= window {
            entry.cleared_since = None;
            return (
                candidate,
                TransitionReason::SustainedClearance {
                    window_hours: window.num_hours(),
                },
            );
        }

        (assessment.status, assessment.reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::StrategyCategory;
    use crate::domain::id::StrategyId;

    fn record(win_rate: f64, roi: f64, sample_size: u32) -> PerformanceRecord {
        PerformanceRecord {
            strategy_id: StrategyId::new("s"),
            win_rate,
            roi,
            sample_size,
            consecutive_losses: 0,
            observed_at: Utc::now(),
            source_partition: String::new(),
        }
    }

    fn evaluator() -> LifecycleEvaluator {
        LifecycleEvaluator::default()
    }

    #[test]
    fn insufficient_samples_leave_status_unchanged() {
        let a = evaluator().evaluate(&record(0.1, -50.0, 4), LifecycleStatus::Active, 30);
        assert_eq!(a.status, LifecycleStatus::Active);
        assert!(matches!(a.reason, TransitionReason::InsufficientSamples { .. }));
    }

    #[test]
    fn hard_floor_quarantines_regardless_of_win_rate() {
        for win_rate in [0.0, 0.5, 0.9, 1.0] {
            let a = evaluator().evaluate(&record(win_rate, -10.5, 5), LifecycleStatus::Active, 30);
            assert_eq!(a.status, LifecycleStatus::Quarantine);
        }
    }

    #[test]
    fn losing_record_quarantines() {
        let a = evaluator().evaluate(&record(0.40, -12.0, 30), LifecycleStatus::Active, 30);
        assert_eq!(a.status, LifecycleStatus::Quarantine);

        let a = evaluator().evaluate(&record(0.48, -1.0, 30), LifecycleStatus::Active, 30);
        assert_eq!(a.status, LifecycleStatus::Quarantine);
        assert!(matches!(a.reason, TransitionReason::LosingRecord { .. }));
    }

    #[test]
    fn weak_and_losing_quarantines() {
        let a = evaluator().evaluate(&record(0.52, -6.0, 30), LifecycleStatus::Active, 30);
        assert_eq!(a.status, LifecycleStatus::Quarantine);
        assert!(matches!(a.reason, TransitionReason::WeakAndLosing { .. }));
    }

    #[test]
    fn below_probation_thresholds() {
        let a = evaluator().evaluate(&record(0.56, -6.0, 30), LifecycleStatus::Active, 30);
        assert_eq!(a.status, LifecycleStatus::Probation);
    }

    #[test]
    fn losing_streak_opens_breaker() {
        let mut r = record(0.60, 5.0, 30);
        r.consecutive_losses = 8;
        let a = evaluator().evaluate(&r, LifecycleStatus::Active, 30);
        assert_eq!(a.status, LifecycleStatus::CircuitBreakerOpen);
    }

    #[test]
    fn young_strategy_is_capped_at_probation() {
        let a = evaluator().evaluate(&record(1.0, 80.0, 49), LifecycleStatus::Probation, 3);
        assert_eq!(a.candidate, LifecycleStatus::Probation);
        assert!(matches!(a.reason, TransitionReason::GracePeriod { .. }));

        let a = evaluator().evaluate(&record(1.0, 80.0, 50), LifecycleStatus::Probation, 3);
        assert_eq!(a.candidate, LifecycleStatus::Active);
    }

    #[test]
    fn upgrades_are_held() {
        let a = evaluator().evaluate(&record(0.62, 18.0, 40), LifecycleStatus::Quarantine, 30);
        assert_eq!(a.status, LifecycleStatus::Quarantine);
        assert_eq!(a.candidate, LifecycleStatus::Active);
        assert!(a.is_upgrade_held());
    }

    #[test]
    fn deprecated_is_terminal() {
        let a = evaluator().evaluate(&record(0.9, 40.0, 100), LifecycleStatus::Deprecated, 300);
        assert_eq!(a.status, LifecycleStatus::Deprecated);
        assert_eq!(a.reason, TransitionReason::Retired);
    }

    #[test]
    fn malformed_record_leaves_status() {
        let a = evaluator().evaluate(&record(f64::NAN, 1.0, 40), LifecycleStatus::Probation, 30);
        assert_eq!(a.status, LifecycleStatus::Probation);
        assert!(matches!(a.reason, TransitionReason::MalformedRecord { .. }));
    }

    #[test]
    fn evaluate_is_idempotent() {
        let r = record(0.51, -2.0, 12);
        let first = evaluator().evaluate(&r, LifecycleStatus::Active, 9);
        let second = evaluator().evaluate(&r, LifecycleStatus::Active, 9);
        assert_eq!(first, second);
    }

    #[test]
    fn onboarding_strategy_graduates_immediately() {
        let now = Utc::now();
        let mut entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::Statistical,
            now - Duration::days(20),
            7,
        );
        let resolution = evaluator().resolve(&mut entry, &record(0.62, 18.0, 40), now);
        assert_eq!(resolution.status, LifecycleStatus::Active);
        assert_eq!(resolution.reason, TransitionReason::Graduated);
        assert!(!entry.onboarding);
        assert_eq!(entry.counters.transitions, 1);
    }

    #[test]
    fn recovery_requires_sustained_clearance() {
        let start = Utc::now();
        let mut entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::Statistical,
            start - Duration::days(60),
            7,
        );
        entry.onboarding = false;
        entry.status = LifecycleStatus::CircuitBreakerOpen;
        let healthy = record(0.60, 8.0, 60);
        let ev = evaluator();

        let first = ev.resolve(&mut entry, &healthy, start);
        assert_eq!(first.status, LifecycleStatus::CircuitBreakerOpen);
        assert_eq!(entry.cleared_since, Some(start));

        let later = ev.resolve(&mut entry, &healthy, start + Duration::hours(12));
        assert_eq!(later.status, LifecycleStatus::CircuitBreakerOpen);

        let done = ev.resolve(&mut entry, &healthy, start + Duration::hours(24));
        assert_eq!(done.status, LifecycleStatus::Active);
        assert!(matches!(done.reason, TransitionReason::SustainedClearance { .. }));
        assert!(entry.cleared_since.is_none());
    }

    #[test]
    fn relapse_resets_clearance() {
        let start = Utc::now();
        let mut entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::Statistical,
            start - Duration::days(60),
            7,
        );
        entry.onboarding = false;
        entry.status = LifecycleStatus::Probation;
        let ev = evaluator();

        ev.resolve(&mut entry, &record(0.60, 8.0, 60), start);
        assert!(entry.cleared_since.is_some());
        ev.resolve(&mut entry, &record(0.44, 1.0, 60), start + Duration::hours(6));
        assert!(entry.cleared_since.is_none());
        let r = ev.resolve(&mut entry, &record(0.60, 8.0, 60), start + Duration::hours(25));
        assert_eq!(r.status, LifecycleStatus::Probation);
    }

    #[test]
    fn below_probation_cycles_accumulate_while_retained() {
        let now = Utc::now();
        let mut entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::Statistical,
            now - Duration::days(60),
            7,
        );
        entry.onboarding = false;
        entry.status = LifecycleStatus::Active;
        let ev = evaluator();
        ev.resolve(&mut entry, &record(0.40, -3.0, 3), now);
        ev.resolve(&mut entry, &record(0.40, -3.0, 4), now);
        assert_eq!(entry.status, LifecycleStatus::Active);
        assert_eq!(entry.counters.cycles_below_probation, 2);
        ev.resolve(&mut entry, &record(0.60, 3.0, 4), now);
        assert_eq!(entry.counters.cycles_below_probation, 0);
    }
}
