//! Deterministic mapping from (status, performance) to configuration.

use chrono::{DateTime, Utc};

use crate::domain::configuration::{Activation, ConfigurationVersion, StrategyConfiguration, Tuning};
use crate::domain::id::StrategyId;
use crate::domain::lifecycle::LifecycleStatus;
use crate::domain::performance::PerformanceRecord;

/// Tunable constants for the builder formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderPolicy {
    pub multiplier_floor: f64,
    pub multiplier_ceiling: f64,
    /// Multiplier lost per cycle spent below probation thresholds while enabled.
    pub decay_rate: f64,
    /// Win rate below which the signal threshold starts rising.
    pub threshold_win_rate: f64,
    pub max_threshold_adjustment: f64,
    pub min_weight: f64,
}

impl Default for BuilderPolicy {
    fn default() -> Self {
        Self {
            multiplier_floor: 0.5,
            multiplier_ceiling: 1.2,
            decay_rate: 0.05,
            threshold_win_rate: 0.60,
            max_threshold_adjustment: 0.15,
            min_weight: 0.05,
        }
    }
}

/// Inputs for one strategy's configuration.
#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    pub strategy_id: &'a StrategyId,
    pub status: LifecycleStatus,
    /// `None` when no record carries enough evidence for a decision.
    pub record: Option<&'a PerformanceRecord>,
    /// Configuration published for the strategy in the live snapshot.
    pub previous: Option<&'a StrategyConfiguration>,
    pub cycles_below_probation: u32,
    /// Decay steps applied to a carried-forward multiplier this cycle.
    pub decay_steps: u32,
    /// Conservative tuning used when there is no record.
    pub fallback: Tuning,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    policy: BuilderPolicy,
}

impl ConfigurationBuilder {
    #[must_use]
    pub const fn new(policy: BuilderPolicy) -> Self {
        Self { policy }
    }

    /// Build a configuration. Identical inputs always yield identical output.
    #[must_use]
    pub fn build(
        &self,
        input: BuildInput<'_>,
        version: ConfigurationVersion,
        derived_at: DateTime<Utc>,
    ) -> StrategyConfiguration {
        if input.record.is_none() {
            if let Some(previous) = input.previous.filter(|p| p.status == input.status) {
                return self.carry_forward(previous, input.decay_steps, version, derived_at);
            }
        }

        let activation = match (input.status, input.record) {
            (LifecycleStatus::Active, Some(record)) => {
                Activation::Enabled(self.tuning(record, input.cycles_below_probation))
            }
            (LifecycleStatus::Active, None) => Activation::Enabled(input.fallback),
            (_, Some(_)) => Activation::Disabled { staged: None },
            (_, None) => Activation::Disabled {
                staged: Some(input.fallback),
            },
        };

        StrategyConfiguration {
            strategy_id: input.strategy_id.clone(),
            status: input.status,
            activation,
            derived_at,
            version,
        }
    }

    /// Re-issue `previous` under a new version. Only the multiplier moves,
    /// decaying toward the floor.
    #[must_use]
    pub fn carry_forward(
        &self,
        previous: &StrategyConfiguration,
        decay_steps: u32,
        version: ConfigurationVersion,
        derived_at: DateTime<Utc>,
    ) -> StrategyConfiguration {
        let p = &self.policy;
        let activation = match &previous.activation {
            Activation::Enabled(tuning) => {
                let decayed = tuning.confidence_multiplier - p.decay_rate * f64::from(decay_steps);
                Activation::Enabled(Tuning {
                    confidence_multiplier: decayed.clamp(p.multiplier_floor, p.multiplier_ceiling),
                    ..*tuning
                })
            }
            disabled => disabled.clone(),
        };

        StrategyConfiguration {
            strategy_id: previous.strategy_id.clone(),
            status: previous.status,
            activation,
            derived_at,
            version,
        }
    }

    /// Tuning for an ACTIVE strategy with data.
    #[must_use]
    pub fn tuning(&self, record: &PerformanceRecord, cycles_below_probation: u32) -> Tuning {
        Tuning {
            confidence_multiplier: self.confidence_multiplier(record, cycles_below_probation),
            threshold_adjustment: self.threshold_adjustment(record.win_rate),
            ensemble_weight: self.ensemble_weight(record.roi),
            max_emissions_per_period: emission_cap(record.roi),
        }
    }

    #[must_use]
    pub fn confidence_multiplier(&self, record: &PerformanceRecord, cycles_below: u32) -> f64 {
        let p = &self.policy;
        let raw = 0.8 + record.roi / 100.0 + 1.5 * (record.win_rate - 0.5)
            - p.decay_rate * f64::from(cycles_below);
        raw.clamp(p.multiplier_floor, p.multiplier_ceiling)
    }

    #[must_use]
    pub fn threshold_adjustment(&self, win_rate: f64) -> f64 {
        let p = &self.policy;
        ((p.threshold_win_rate - win_rate).max(0.0) * 0.5).min(p.max_threshold_adjustment)
    }

    #[must_use]
    pub fn ensemble_weight(&self, roi: f64) -> f64 {
        (0.5 + roi / 45.0).clamp(self.policy.min_weight, 1.0)
    }
}

/// Approved emissions per UTC day by ROI tier.
#[must_use]
pub fn emission_cap(roi: f64) -> u32 {
    match roi {
        r if r >= 20.0 => 10,
        r if r >= 10.0 => 6,
        r if r >= 5.0 => 4,
        r if r >= 0.0 => 2,
        _ => 1,
    }
}
