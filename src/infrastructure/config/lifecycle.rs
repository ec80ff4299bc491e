//! Lifecycle and configuration-builder settings.
//!
//! `[lifecycle]` holds the transition thresholds applied by the evaluator;
//! `[builder]` holds the bounds of the per-strategy tuning formulas.

use chrono::Duration;
use serde::Deserialize;

use crate::application::configuration::BuilderPolicy;
use crate::application::lifecycle::LifecycleThresholds;

/// Transition thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Sample size below which a strategy's status is left unchanged.
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,

    /// ROI (percent) below which a strategy is quarantined regardless of win rate.
    #[serde(default = "default_hard_roi_floor")]
    pub hard_roi_floor: f64,

    #[serde(default = "default_probation_roi")]
    pub probation_roi: f64,

    #[serde(default = "default_probation_win_rate")]
    pub probation_win_rate: f64,

    /// Losing streak that opens the circuit breaker.
    #[serde(default = "default_consecutive_loss_threshold")]
    pub consecutive_loss_threshold: u32,

    /// Onboarding grace period for newly registered strategies.
    #[serde(default = "default_grace_days")]
    pub grace_days: i64,

    /// Sample size that lifts the grace cap early.
    #[serde(default = "default_robust_sample_size")]
    pub robust_sample_size: u32,

    /// Hours an upgrade candidate must hold before it is applied.
    #[serde(default = "default_evaluation_window_hours")]
    pub evaluation_window_hours: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            hard_roi_floor: default_hard_roi_floor(),
            probation_roi: default_probation_roi(),
            probation_win_rate: default_probation_win_rate(),
            consecutive_loss_threshold: default_consecutive_loss_threshold(),
            grace_days: default_grace_days(),
            robust_sample_size: default_robust_sample_size(),
            evaluation_window_hours: default_evaluation_window_hours(),
        }
    }
}

impl From<&LifecycleConfig> for LifecycleThresholds {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            hard_roi_floor: config.hard_roi_floor,
            probation_roi: config.probation_roi,
            probation_win_rate: config.probation_win_rate,
            consecutive_loss_threshold: config.consecutive_loss_threshold,
            grace_days: config.grace_days,
            robust_sample_size: config.robust_sample_size,
            evaluation_window: hours(config.evaluation_window_hours),
        }
    }
}

const fn default_min_samples() -> u32 {
    5
}

const fn default_hard_roi_floor() -> f64 {
    -10.0
}

const fn default_probation_roi() -> f64 {
    -5.0
}

const fn default_probation_win_rate() -> f64 {
    0.45
}

const fn default_consecutive_loss_threshold() -> u32 {
    8
}

const fn default_grace_days() -> i64 {
    7
}

const fn default_robust_sample_size() -> u32 {
    50
}

const fn default_evaluation_window_hours() -> u64 {
    24
}

/// Bounds for the tuning formulas.
#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_multiplier_floor")]
    pub multiplier_floor: f64,

    #[serde(default = "default_multiplier_ceiling")]
    pub multiplier_ceiling: f64,

    /// Multiplier lost per cycle spent below probation thresholds.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Win rate below which the signal threshold starts rising.
    #[serde(default = "default_threshold_win_rate")]
    pub threshold_win_rate: f64,

    #[serde(default = "default_max_threshold_adjustment")]
    pub max_threshold_adjustment: f64,

    /// Smallest ensemble weight an active strategy can carry.
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            multiplier_floor: default_multiplier_floor(),
            multiplier_ceiling: default_multiplier_ceiling(),
            decay_rate: default_decay_rate(),
            threshold_win_rate: default_threshold_win_rate(),
            max_threshold_adjustment: default_max_threshold_adjustment(),
            min_weight: default_min_weight(),
        }
    }
}

impl From<&BuilderConfig> for BuilderPolicy {
    fn from(config: &BuilderConfig) -> Self {
        Self {
            multiplier_floor: config.multiplier_floor,
            multiplier_ceiling: config.multiplier_ceiling,
            decay_rate: config.decay_rate,
            threshold_win_rate: config.threshold_win_rate,
            max_threshold_adjustment: config.max_threshold_adjustment,
            min_weight: config.min_weight,
        }
    }
}

const fn default_multiplier_floor() -> f64 {
    0.5
}

const fn default_multiplier_ceiling() -> f64 {
    1.2
}

const fn default_decay_rate() -> f64 {
    0.05
}

const fn default_threshold_win_rate() -> f64 {
    0.60
}

const fn default_max_threshold_adjustment() -> f64 {
    0.15
}

const fn default_min_weight() -> f64 {
    0.05
}

/// Longest window any duration setting may express: one century.
pub(super) const MAX_MINUTES: u64 = 60 * 24 * 365 * 100;

pub(super) fn minutes(value: u64) -> Duration {
    Duration::minutes(i64::try_from(value.min(MAX_MINUTES)).unwrap_or_default())
}

pub(super) fn hours(value: u64) -> Duration {
    minutes(value.saturating_mul(60))
}
