//! Per-strategy live configuration.
//!
//! A [`StrategyConfiguration`] is built fresh every cycle and never mutated;
//! the next version supersedes it. Whether a strategy may act is encoded in
//! [`Activation`], so a disabled configuration carries no effective weight.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::StrategyId;
use super::lifecycle::LifecycleStatus;

/// Monotonic configuration version.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConfigurationVersion(u64);

impl ConfigurationVersion {
    /// Version of the empty state before anything was published.
    pub const INITIAL: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The version that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ConfigurationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Parameters an enabled strategy runs with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Scale applied to the strategy's raw confidence.
    pub confidence_multiplier: f64,
    /// Added to the minimum confidence a raw signal needs to be admitted.
    pub threshold_adjustment: f64,
    /// Trust in `[0, 1]` during ensemble conflict resolution.
    pub ensemble_weight: f64,
    /// Approved gate checks allowed per UTC day.
    pub max_emissions_per_period: u32,
}

/// Whether a strategy may act, and with what tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Activation {
    Enabled(Tuning),
    Disabled {
        /// Conservative tuning applied on manual promotion before data exists.
        staged: Option<Tuning>,
    },
}

/// Live configuration of one strategy at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfiguration {
    pub strategy_id: StrategyId,
    pub status: LifecycleStatus,
    pub activation: Activation,
    pub derived_at: DateTime<Utc>,
    pub version: ConfigurationVersion,
}

impl StrategyConfiguration {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.activation, Activation::Enabled(_))
    }

    /// Tuning in effect, if enabled.
    #[must_use]
    pub const fn tuning(&self) -> Option<&Tuning> {
        match &self.activation {
            Activation::Enabled(tuning) => Some(tuning),
            Activation::Disabled { .. } => None,
        }
    }

    /// Ensemble weight in effect; zero when disabled.
    #[must_use]
    pub fn ensemble_weight(&self) -> f64 {
        self.tuning().map_or(0.0, |t| t.ensemble_weight)
    }

    /// Emission cap in effect; zero when disabled.
    #[must_use]
    pub fn max_emissions_per_period(&self) -> u32 {
        self.tuning().map_or(0, |t| t.max_emissions_per_period)
    }

    /// Confidence multiplier in effect; zero when disabled.
    #[must_use]
    pub fn confidence_multiplier(&self) -> f64 {
        self.tuning().map_or(0.0, |t| t.confidence_multiplier)
    }

    /// Threshold adjustment in effect; zero when disabled.
    #[must_use]
    pub fn threshold_adjustment(&self) -> f64 {
        self.tuning().map_or(0.0, |t| t.threshold_adjustment)
    }

    /// Tuning carried by this configuration whether or not it is in effect.
    #[must_use]
    pub const fn staged_tuning(&self) -> Option<&Tuning> {
        match &self.activation {
            Activation::Enabled(tuning) => Some(tuning),
            Activation::Disabled { staged } => staged.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning {
            confidence_multiplier: 1.1,
            threshold_adjustment: 0.0,
            ensemble_weight: 0.9,
            max_emissions_per_period: 6,
        }
    }

    fn config(activation: Activation, status: LifecycleStatus) -> StrategyConfiguration {
        StrategyConfiguration {
            strategy_id: StrategyId::new("s"),
            status,
            activation,
            derived_at: Utc::now(),
            version: ConfigurationVersion::new(3),
        }
    }

    #[test]
    fn disabled_configuration_has_no_weight_even_when_staged() {
        let cfg = config(
            Activation::Disabled {
                staged: Some(tuning()),
            },
            LifecycleStatus::Probation,
        );
        assert!(!cfg.is_enabled());
        assert_eq!(cfg.ensemble_weight(), 0.0);
        assert_eq!(cfg.max_emissions_per_period(), 0);
        assert!(cfg.staged_tuning().is_some());
    }

    #[test]
    fn enabled_configuration_exposes_tuning() {
        let cfg = config(Activation::Enabled(tuning()), LifecycleStatus::Active);
        assert!(cfg.is_enabled());
        assert_eq!(cfg.ensemble_weight(), 0.9);
        assert_eq!(cfg.max_emissions_per_period(), 6);
    }

    #[test]
    fn version_next_is_strictly_greater() {
        let v = ConfigurationVersion::new(41);
        assert!(v.next() > v);
        assert_eq!(v.next().to_string(), "v42");
    }
}
