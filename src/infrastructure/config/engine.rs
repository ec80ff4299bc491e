//! Trigger, cold-start, execution and persistence settings.

use std::time::Duration as StdDuration;

use serde::Deserialize;

use crate::application::configuration::BootstrapPolicy;
use crate::application::engine::{ExecutionPolicy, RetryPolicy};
use crate::application::trigger::TriggerPolicy;
use crate::domain::configuration::Tuning;

use super::lifecycle::{hours, minutes};
use super::strategy::StrategyDecl;

/// When refreshes fire.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_scheduled_interval_mins")]
    pub scheduled_interval_mins: u64,

    /// Quiet period after a refresh during which only manual overrides fire.
    #[serde(default = "default_debounce_mins")]
    pub debounce_mins: u64,

    /// Age after which a scheduled refresh is forced through the debounce.
    #[serde(default = "default_staleness_ceiling_hours")]
    pub staleness_ceiling_hours: u64,

    /// ROI drop in percentage points that counts as degradation.
    #[serde(default = "default_degradation_points")]
    pub degradation_points: f64,

    /// How often the background loop wakes to poll.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Performance rows older than this are ignored.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            scheduled_interval_mins: default_scheduled_interval_mins(),
            debounce_mins: default_debounce_mins(),
            staleness_ceiling_hours: default_staleness_ceiling_hours(),
            degradation_points: default_degradation_points(),
            poll_interval_secs: default_poll_interval_secs(),
            lookback_days: default_lookback_days(),
        }
    }
}

impl From<&TriggerConfig> for TriggerPolicy {
    fn from(config: &TriggerConfig) -> Self {
        Self {
            scheduled_interval: minutes(config.scheduled_interval_mins),
            debounce: minutes(config.debounce_mins),
            staleness_ceiling: hours(config.staleness_ceiling_hours),
            degradation_points: config.degradation_points,
        }
    }
}

const fn default_scheduled_interval_mins() -> u64 {
    15
}

const fn default_debounce_mins() -> u64 {
    5
}

const fn default_staleness_ceiling_hours() -> u64 {
    4
}

const fn default_degradation_points() -> f64 {
    15.0
}

const fn default_poll_interval_secs() -> u64 {
    30
}

const fn default_lookback_days() -> u32 {
    30
}

/// Cold-start fallback set and its conservative tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Strategies configured when no performance data exists.
    #[serde(default)]
    pub fallback: Vec<StrategyDecl>,

    #[serde(default = "default_bootstrap_multiplier")]
    pub confidence_multiplier: f64,

    #[serde(default = "default_bootstrap_weight")]
    pub ensemble_weight: f64,

    #[serde(default = "default_bootstrap_emissions")]
    pub max_emissions_per_period: u32,

    #[serde(default = "default_bootstrap_grace_days")]
    pub grace_days: i64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            fallback: Vec::new(),
            confidence_multiplier: default_bootstrap_multiplier(),
            ensemble_weight: default_bootstrap_weight(),
            max_emissions_per_period: default_bootstrap_emissions(),
            grace_days: default_bootstrap_grace_days(),
        }
    }
}

impl From<&BootstrapConfig> for BootstrapPolicy {
    fn from(config: &BootstrapConfig) -> Self {
        Self {
            fallback: config.fallback.iter().map(StrategyDecl::to_pair).collect(),
            tuning: Tuning {
                confidence_multiplier: config.confidence_multiplier,
                threshold_adjustment: 0.0,
                ensemble_weight: config.ensemble_weight,
                max_emissions_per_period: config.max_emissions_per_period,
            },
            grace_days: config.grace_days,
        }
    }
}

const fn default_bootstrap_multiplier() -> f64 {
    0.8
}

const fn default_bootstrap_weight() -> f64 {
    0.3
}

const fn default_bootstrap_emissions() -> u32 {
    1
}

const fn default_bootstrap_grace_days() -> i64 {
    14
}

/// Per-cycle execution budgets.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,

    /// Soft timeout; signals collected so far are still arbitrated.
    #[serde(default = "default_cycle_timeout_ms")]
    pub cycle_timeout_ms: u64,

    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u64,

    /// Raw confidence a signal needs before threshold adjustment.
    #[serde(default = "default_min_signal_confidence")]
    pub min_signal_confidence: f64,

    /// Directory of per-strategy signal files. Without it the engine runs dry.
    #[serde(default)]
    pub signals_dir: Option<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            strategy_timeout_ms: default_strategy_timeout_ms(),
            cycle_timeout_ms: default_cycle_timeout_ms(),
            horizon_hours: default_horizon_hours(),
            min_signal_confidence: default_min_signal_confidence(),
            signals_dir: None,
        }
    }
}

impl From<&ExecutionConfig> for ExecutionPolicy {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            strategy_timeout: StdDuration::from_millis(config.strategy_timeout_ms),
            cycle_timeout: StdDuration::from_millis(config.cycle_timeout_ms),
            horizon: StdDuration::from_secs(config.horizon_hours.saturating_mul(3600)),
            min_signal_confidence: config.min_signal_confidence,
        }
    }
}

const fn default_strategy_timeout_ms() -> u64 {
    10_000
}

const fn default_cycle_timeout_ms() -> u64 {
    60_000
}

const fn default_horizon_hours() -> u64 {
    24
}

const fn default_min_signal_confidence() -> f64 {
    0.5
}

/// Retry policy for snapshot and audit writes.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl From<&PersistenceConfig> for RetryPolicy {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: StdDuration::from_millis(config.initial_delay_ms),
            max_delay: StdDuration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
        }
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    200
}

const fn default_max_delay_ms() -> u64 {
    5_000
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}
