//! Strategy lifecycle states and the events recorded when they change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::StrategyId;
use super::performance::PerformanceSnapshot;

/// Lifecycle status of a strategy.
///
/// Only [`LifecycleStatus::Active`] strategies may emit signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Active,
    Probation,
    Quarantine,
    CircuitBreakerOpen,
    Deprecated,
}

impl LifecycleStatus {
    /// All statuses, best first.
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::Probation,
        Self::CircuitBreakerOpen,
        Self::Quarantine,
        Self::Deprecated,
    ];

    /// Severity rank; higher is worse.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Probation => 1,
            Self::CircuitBreakerOpen => 2,
            Self::Quarantine => 3,
            Self::Deprecated => 4,
        }
    }

    /// Return `true` if moving to `other` would be a downgrade.
    #[must_use]
    pub const fn is_worse_than(self, other: Self) -> bool {
        self.severity() > other.severity()
    }

    /// Return the worse of two statuses.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Stable name used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Probation => "PROBATION",
            Self::Quarantine => "QUARANTINE",
            Self::CircuitBreakerOpen => "CIRCUIT_BREAKER_OPEN",
            Self::Deprecated => "DEPRECATED",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "PROBATION" => Ok(Self::Probation),
            "QUARANTINE" => Ok(Self::Quarantine),
            "CIRCUIT_BREAKER_OPEN" => Ok(Self::CircuitBreakerOpen),
            "DEPRECATED" => Ok(Self::Deprecated),
            other => Err(format!("unknown lifecycle status: {other}")),
        }
    }
}

/// Why the evaluator settled on a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionReason {
    /// Not enough settled signals to act on.
    InsufficientSamples { sample_size: u32, required: u32 },
    /// ROI below the hard floor.
    RoiBelowFloor { roi: f64, floor: f64 },
    /// Losing more often than winning while losing money.
    LosingRecord { win_rate: f64, roi: f64 },
    /// Marginal win rate with a material loss.
    WeakAndLosing { win_rate: f64, roi: f64 },
    /// Below the probation ROI or win-rate threshold.
    BelowProbation { win_rate: f64, roi: f64 },
    /// Losing streak reached the breaker threshold.
    ConsecutiveLosses { count: u32, threshold: u32 },
    /// Within the onboarding grace period without a robust sample.
    GracePeriod { age_days: i64, grace_days: i64 },
    /// Metrics clear every threshold.
    Healthy,
    /// Upgrade held until clearance is sustained.
    AwaitingClearance { candidate: LifecycleStatus },
    /// Upgrade after clearing thresholds for a full evaluation window.
    SustainedClearance { window_hours: i64 },
    /// First promotion out of onboarding probation.
    Graduated,
    /// New strategy registered.
    Registered,
    /// Record failed validation; status left as-is.
    MalformedRecord { detail: String },
    /// Retired strategies are not evaluated.
    Retired,
    /// Explicit operator action.
    Manual { by: String, note: String },
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSamples {
                sample_size,
                required,
            } => write!(f, "insufficient samples ({sample_size} < {required})"),
            Self::RoiBelowFloor { roi, floor } => {
                write!(f, "ROI {roi:+.1}% below hard floor {floor:+.1}%")
            }
            Self::LosingRecord { win_rate, roi } => write!(
                f,
                "losing record (win rate {:.1}%, ROI {roi:+.1}%)",
                win_rate * 100.0
            ),
            Self::WeakAndLosing { win_rate, roi } => write!(
                f,
                "weak win rate {:.1}% with ROI {roi:+.1}%",
                win_rate * 100.0
            ),
            Self::BelowProbation { win_rate, roi } => write!(
                f,
                "below probation thresholds (win rate {:.1}%, ROI {roi:+.1}%)",
                win_rate * 100.0
            ),
            Self::ConsecutiveLosses { count, threshold } => {
                write!(f, "{count} consecutive losses (threshold {threshold})")
            }
            Self::GracePeriod {
                age_days,
                grace_days,
            } => write!(f, "onboarding grace period (day {age_days} of {grace_days})"),
            Self::Healthy => f.write_str("healthy"),
            Self::AwaitingClearance { candidate } => {
                write!(f, "awaiting sustained clearance for {candidate}")
            }
            Self::SustainedClearance { window_hours } => {
                write!(f, "thresholds cleared for {window_hours}h")
            }
            Self::Graduated => f.write_str("graduated from onboarding probation"),
            Self::Registered => f.write_str("registered"),
            Self::MalformedRecord { detail } => write!(f, "malformed record: {detail}"),
            Self::Retired => f.write_str("deprecated"),
            Self::Manual { by, note } => {
                if note.is_empty() {
                    write!(f, "manual action by {by}")
                } else {
                    write!(f, "manual action by {by}: {note}")
                }
            }
        }
    }
}

/// Append-only record of a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub strategy_id: StrategyId,
    /// `None` when the strategy was just registered.
    pub previous_status: Option<LifecycleStatus>,
    pub new_status: LifecycleStatus,
    pub reason: TransitionReason,
    pub performance: Option<PerformanceSnapshot>,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Return `true` if this event moved the strategy to a worse status.
    #[must_use]
    pub fn is_downgrade(&self) -> bool {
        self.previous_status
            .is_some_and(|previous| self.new_status.is_worse_than(previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_statuses() {
        assert!(LifecycleStatus::Quarantine.is_worse_than(LifecycleStatus::Probation));
        assert!(LifecycleStatus::CircuitBreakerOpen.is_worse_than(LifecycleStatus::Active));
        assert!(!LifecycleStatus::Active.is_worse_than(LifecycleStatus::Probation));
        assert_eq!(
            LifecycleStatus::Probation.worst(LifecycleStatus::Quarantine),
            LifecycleStatus::Quarantine
        );
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in LifecycleStatus::ALL {
            assert_eq!(status.as_str().parse::<LifecycleStatus>(), Ok(status));
        }
        assert!("sideways".parse::<LifecycleStatus>().is_err());
    }

    #[test]
    fn reason_display_mentions_metrics() {
        let reason = TransitionReason::RoiBelowFloor {
            roi: -12.0,
            floor: -10.0,
        };
        assert_eq!(reason.to_string(), "ROI -12.0% below hard floor -10.0%");
    }

    #[test]
    fn downgrade_detection() {
        let event = LifecycleEvent {
            strategy_id: StrategyId::new("s"),
            previous_status: Some(LifecycleStatus::Active),
            new_status: LifecycleStatus::Quarantine,
            reason: TransitionReason::Healthy,
            performance: None,
            timestamp: Utc::now(),
        };
        assert!(event.is_downgrade());
    }
}
