//! Registry entries for known strategies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::StrategyCategory;
use super::id::StrategyId;
use super::lifecycle::LifecycleStatus;

/// Bookkeeping counters kept per strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCounters {
    /// Evaluations run against a performance record.
    pub evaluations: u32,
    /// Status changes applied.
    pub transitions: u32,
    /// Consecutive cycles enabled while the record sat below probation thresholds.
    pub cycles_below_probation: u32,
    /// Gate checks approved over the strategy's lifetime.
    pub approved_emissions: u64,
}

/// Durable catalogue row for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyEntry {
    pub id: StrategyId,
    pub category: StrategyCategory,
    pub first_seen: DateTime<Utc>,
    /// Days a young strategy is held below ACTIVE without a robust sample.
    pub grace_days: i64,
    pub status: LifecycleStatus,
    /// True until the strategy is first promoted to ACTIVE.
    pub onboarding: bool,
    /// Start of the current run of clean evaluations that would allow an upgrade.
    pub cleared_since: Option<DateTime<Utc>>,
    pub counters: StrategyCounters,
}

impl StrategyEntry {
    /// A freshly registered strategy: onboarding PROBATION.
    #[must_use]
    pub fn new(
        id: StrategyId,
        category: StrategyCategory,
        first_seen: DateTime<Utc>,
        grace_days: i64,
    ) -> Self {
        Self {
            id,
            category,
            first_seen,
            grace_days,
            status: LifecycleStatus::Probation,
            onboarding: true,
            cleared_since: None,
            counters: StrategyCounters::default(),
        }
    }

    /// Whole days since the strategy was first seen.
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.first_seen).num_days().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_entry_starts_in_onboarding_probation() {
        let entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::Statistical,
            Utc::now(),
            7,
        );
        assert_eq!(entry.status, LifecycleStatus::Probation);
        assert!(entry.onboarding);
        assert!(entry.cleared_since.is_none());
    }

    #[test]
    fn age_days_never_negative() {
        let now = Utc::now();
        let entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::default(),
            now + Duration::days(1),
            7,
        );
        assert_eq!(entry.age_days(now), 0);
        let entry = StrategyEntry::new(
            StrategyId::new("s"),
            StrategyCategory::default(),
            now - Duration::days(20),
            7,
        );
        assert_eq!(entry.age_days(now), 20);
    }
}
