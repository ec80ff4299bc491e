//! Published, immutable snapshot of every strategy's configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::configuration::{ConfigurationVersion, StrategyConfiguration};
use super::id::StrategyId;
use super::lifecycle::LifecycleStatus;
use super::performance::PerformanceRecord;
use super::trigger::TriggerKind;

/// Where a snapshot's configurations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    /// Derived from performance records.
    Performance,
    /// Conservative defaults; no performance data was available.
    ColdStart,
    /// Nothing published yet.
    Empty,
}

/// One published version of the live configuration.
///
/// Never mutated after publication; readers hold an `Arc` for the duration
/// of their call and see either the whole old or the whole new version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStrategyState {
    pub version: ConfigurationVersion,
    pub derived_at: DateTime<Utc>,
    pub trigger: TriggerKind,
    pub origin: SnapshotOrigin,
    pub configurations: BTreeMap<StrategyId, StrategyConfiguration>,
    /// Records the configurations were derived from.
    pub metrics: BTreeMap<StrategyId, PerformanceRecord>,
}

impl LiveStrategyState {
    /// The placeholder state served before the first publication.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: ConfigurationVersion::INITIAL,
            derived_at: now,
            trigger: TriggerKind::Startup,
            origin: SnapshotOrigin::Empty,
            configurations: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &StrategyId) -> Option<&StrategyConfiguration> {
        self.configurations.get(id)
    }

    /// Configurations that may act, in id order.
    pub fn enabled(&self) -> impl Iterator<Item = &StrategyConfiguration> {
        self.configurations.values().filter(|c| c.is_enabled())
    }

    /// Configurations that may not act, in id order.
    pub fn disabled(&self) -> impl Iterator<Item = &StrategyConfiguration> {
        self.configurations.values().filter(|c| !c.is_enabled())
    }

    /// Count of strategies per status.
    #[must_use]
    pub fn summary(&self) -> StateSummary {
        let mut summary = StateSummary::default();
        for config in self.configurations.values() {
            match config.status {
                LifecycleStatus::Active => summary.active += 1,
                LifecycleStatus::Probation => summary.probation += 1,
                LifecycleStatus::Quarantine => summary.quarantine += 1,
                LifecycleStatus::CircuitBreakerOpen => summary.circuit_breaker_open += 1,
                LifecycleStatus::Deprecated => summary.deprecated += 1,
            }
            if config.is_enabled() {
                summary.enabled += 1;
            }
        }
        summary.total = self.configurations.len();
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub total: usize,
    pub enabled: usize,
    pub active: usize,
    pub probation: usize,
    pub quarantine: usize,
    pub circuit_breaker_open: usize,
    pub deprecated: usize,
}

/// Why a served configuration is not fully trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    ColdStart,
    PerformanceUnavailable,
    PersistenceFailed,
    Stale,
}

impl DegradedReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColdStart => "cold start",
            Self::PerformanceUnavailable => "performance store unavailable",
            Self::PersistenceFailed => "persistence failed",
            Self::Stale => "stale",
        }
    }
}

/// What callers of the live-configuration query receive.
#[derive(Debug, Clone)]
pub struct LiveConfiguration {
    pub state: Arc<LiveStrategyState>,
    pub degraded: bool,
    pub degraded_reason: Option<DegradedReason>,
}

impl LiveConfiguration {
    #[must_use]
    pub fn version(&self) -> ConfigurationVersion {
        self.state.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configuration::{Activation, Tuning};

    fn config(id: &str, status: LifecycleStatus, enabled: bool) -> StrategyConfiguration {
        let activation = if enabled {
            Activation::Enabled(Tuning {
                confidence_multiplier: 1.0,
                threshold_adjustment: 0.0,
                ensemble_weight: 0.5,
                max_emissions_per_period: 2,
            })
        } else {
            Activation::Disabled { staged: None }
        };
        StrategyConfiguration {
            strategy_id: StrategyId::new(id),
            status,
            activation,
            derived_at: Utc::now(),
            version: ConfigurationVersion::new(1),
        }
    }

    #[test]
    fn summary_counts_statuses() {
        let mut state = LiveStrategyState::empty(Utc::now());
        for (id, status, enabled) in [
            ("a", LifecycleStatus::Active, true),
            ("b", LifecycleStatus::Probation, false),
            ("c", LifecycleStatus::Quarantine, false),
        ] {
            state
                .configurations
                .insert(StrategyId::new(id), config(id, status, enabled));
        }

        let summary = state.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.enabled, 1);
        assert_eq!(summary.quarantine, 1);
        assert_eq!(state.enabled().count(), 1);
        assert_eq!(state.disabled().count(), 2);
    }
}
