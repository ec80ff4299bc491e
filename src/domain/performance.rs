//! Historical performance records produced by the measurement subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::StrategyId;

/// Aggregated performance of one strategy over a lookback window.
///
/// Records are produced externally and are read-only here. ROI is expressed
/// in percent per 100 staked (`18.0` means +18%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub strategy_id: StrategyId,
    /// Fraction of settled signals that won, in `[0, 1]`.
    pub win_rate: f64,
    /// Return on investment in percent.
    pub roi: f64,
    /// Number of settled signals behind the aggregate.
    pub sample_size: u32,
    /// Current losing streak at observation time.
    #[serde(default)]
    pub consecutive_losses: u32,
    pub observed_at: DateTime<Utc>,
    /// Partition of the performance store the row was read from.
    #[serde(default)]
    pub source_partition: String,
}

impl PerformanceRecord {
    /// Check that the numeric fields are usable for evaluation.
    ///
    /// Returns a human-readable reason when the record is malformed.
    pub fn validate(&self) -> Result<(), String> {
        if self.strategy_id.as_str().trim().is_empty() {
            return Err("empty strategy id".to_string());
        }
        if !self.win_rate.is_finite() || !(0.0..=1.0).contains(&self.win_rate) {
            return Err(format!("win_rate {} outside [0, 1]", self.win_rate));
        }
        if !self.roi.is_finite() {
            return Err(format!("roi {} is not finite", self.roi));
        }
        Ok(())
    }

    /// Compact copy of the metrics attached to lifecycle events and decisions.
    #[must_use]
    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            win_rate: self.win_rate,
            roi: self.roi,
            sample_size: self.sample_size,
            consecutive_losses: self.consecutive_losses,
        }
    }
}

/// The metrics that drove a lifecycle or arbitration decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub win_rate: f64,
    pub roi: f64,
    pub sample_size: u32,
    pub consecutive_losses: u32,
}

impl std::fmt::Display for PerformanceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "win rate {:.1}%, ROI {:+.1}%, n={}",
            self.win_rate * 100.0,
            self.roi,
            self.sample_size
        )
    }
}
