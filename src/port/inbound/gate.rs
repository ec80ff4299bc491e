//! Validation gate result types.

use std::fmt;

use serde::Serialize;

use crate::domain::lifecycle::LifecycleStatus;

/// Why a gate check passed or was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateReason {
    Approved,
    KillSwitchActive,
    Unregistered,
    Inactive { status: LifecycleStatus },
    /// Recoverable through promotion or sustained clearance.
    CircuitBreakerOpen,
    EmissionCapReached { cap: u32 },
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::KillSwitchActive => f.write_str("kill switch active"),
            Self::Unregistered => f.write_str("strategy not registered"),
            Self::Inactive { status } => write!(f, "strategy is {status}"),
            Self::CircuitBreakerOpen => f.write_str("circuit breaker open"),
            Self::EmissionCapReached { cap } => write!(f, "daily emission cap of {cap} reached"),
        }
    }
}

/// Outcome of one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateResult {
    pub allowed: bool,
    pub reason: GateReason,
    /// Emission cap in effect for the strategy; zero when blocked before lookup.
    pub max_emissions: u32,
    /// Confidence multiplier the caller should apply to raw signals.
    pub confidence_scale: f64,
}

impl GateResult {
    #[must_use]
    pub const fn approved(max_emissions: u32, confidence_scale: f64) -> Self {
        Self {
            allowed: true,
            reason: GateReason::Approved,
            max_emissions,
            confidence_scale,
        }
    }

    #[must_use]
    pub const fn blocked(reason: GateReason) -> Self {
        Self {
            allowed: false,
            reason,
            max_emissions: 0,
            confidence_scale: 0.0,
        }
    }

    /// Return `true` if the block clears without operator action.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self.reason,
            GateReason::CircuitBreakerOpen | GateReason::EmissionCapReached { .. }
        )
    }
}
