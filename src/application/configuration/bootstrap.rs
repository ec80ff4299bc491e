//! Cold-start configuration.
//!
//! Used when the performance store has no rows or cannot be reached and
//! nothing data-backed has been published yet.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::category::StrategyCategory;
use crate::domain::configuration::{Activation, ConfigurationVersion, StrategyConfiguration, Tuning};
use crate::domain::id::StrategyId;
use crate::domain::strategy::StrategyEntry;

/// Cold-start settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapPolicy {
    /// Strategies configured even when nothing else is known.
    pub fallback: Vec<(StrategyId, StrategyCategory)>,
    /// Conservative tuning staged on every cold-start configuration.
    pub tuning: Tuning,
    /// Grace period granted to strategies registered during cold start.
    pub grace_days: i64,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            fallback: Vec::new(),
            tuning: Tuning {
                confidence_multiplier: 0.8,
                threshold_adjustment: 0.0,
                ensemble_weight: 0.3,
                max_emissions_per_period: 1,
            },
            grace_days: 14,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColdStartBootstrapper {
    policy: BootstrapPolicy,
}

impl ColdStartBootstrapper {
    #[must_use]
    pub const fn new(policy: BootstrapPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn fallback(&self) -> &[(StrategyId, StrategyCategory)] {
        &self.policy.fallback
    }

    #[must_use]
    pub const fn tuning(&self) -> Tuning {
        self.policy.tuning
    }

    /// Registry entry for a strategy first seen during cold start.
    #[must_use]
    pub fn entry(
        &self,
        id: StrategyId,
        category: StrategyCategory,
        now: DateTime<Utc>,
    ) -> StrategyEntry {
        StrategyEntry::new(id, category, now, self.policy.grace_days)
    }

    /// Conservative configuration for one known strategy.
    ///
    /// Strategies without data keep whatever status the registry holds; the
    /// tuning is only staged unless an operator already promoted them.
    #[must_use]
    pub fn configure(
        &self,
        entry: &StrategyEntry,
        version: ConfigurationVersion,
        now: DateTime<Utc>,
    ) -> StrategyConfiguration {
        let activation = if entry.status.is_active() {
            Activation::Enabled(self.policy.tuning)
        } else {
            Activation::Disabled {
                staged: Some(self.policy.tuning),
            }
        };
        StrategyConfiguration {
            strategy_id: entry.id.clone(),
            status: entry.status,
            activation,
            derived_at: now,
            version,
        }
    }

    /// Configurations for every entry, in the given order.
    #[must_use]
    pub fn configure_all<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a StrategyEntry>,
        version: ConfigurationVersion,
        now: DateTime<Utc>,
    ) -> Vec<StrategyConfiguration> {
        let configs: Vec<_> = entries
            .into_iter()
            .map(|entry| self.configure(entry, version, now))
            .collect();
        info!(
            strategies = configs.len(),
            version = version.value(),
            "Cold-start configuration derived"
        );
        configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::LifecycleStatus;

    #[test]
    fn cold_start_entries_are_disabled_probation() {
        let bootstrapper = ColdStartBootstrapper::default();
        let now = Utc::now();
        let entry = bootstrapper.entry(StrategyId::new("s"), StrategyCategory::SharpMoney, now);
        assert_eq!(entry.grace_days, 14);
        assert_eq!(entry.status, LifecycleStatus::Probation);

        let cfg = bootstrapper.configure(&entry, ConfigurationVersion::new(1), now);
        assert!(!cfg.is_enabled());
        assert_eq!(cfg.ensemble_weight(), 0.0);
        let staged = cfg.staged_tuning().copied();
        assert_eq!(staged.map(|t| t.ensemble_weight), Some(0.3));
        assert_eq!(staged.map(|t| t.max_emissions_per_period), Some(1));
    }

    #[test]
    fn promoted_strategy_runs_with_conservative_tuning() {
        let bootstrapper = ColdStartBootstrapper::default();
        let now = Utc::now();
        let mut entry = bootstrapper.entry(StrategyId::new("s"), StrategyCategory::SharpMoney, now);
        entry.status = LifecycleStatus::Active;
        let cfg = bootstrapper.configure(&entry, ConfigurationVersion::new(1), now);
        assert!(cfg.is_enabled());
        assert_eq!(cfg.confidence_multiplier(), 0.8);
    }
}
