//! Candidate signals and arbitrated decisions.

use serde::{Deserialize, Serialize};

use super::id::{EntityId, Market, Recommendation, StrategyId};
use super::performance::PerformanceSnapshot;

/// A raw, pre-arbitration recommendation from one strategy.
///
/// Produced and consumed within a single execution cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub entity_id: EntityId,
    pub market: Market,
    pub strategy_id: StrategyId,
    pub recommendation: Recommendation,
    /// Domain-specific signal strength, opaque to the engine.
    pub strength: f64,
    /// Confidence in `[0, 1]` before ensemble weighting.
    pub confidence: f64,
}

/// One strategy's share in a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub strategy_id: StrategyId,
    pub recommendation: Recommendation,
    pub weight: f64,
    pub confidence: f64,
}

/// Why the winning side beat the runner-up in a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictExplanation {
    pub winner: Recommendation,
    pub winner_support: f64,
    pub winner_lead: StrategyId,
    pub winner_metrics: Option<PerformanceSnapshot>,
    pub runner_up: Recommendation,
    pub runner_up_support: f64,
    pub runner_up_lead: StrategyId,
    pub runner_up_metrics: Option<PerformanceSnapshot>,
}

impl std::fmt::Display for ConflictExplanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let metrics = |m: &Option<PerformanceSnapshot>| {
            m.map_or_else(|| "no metrics".to_string(), |s| s.to_string())
        };
        write!(
            f,
            "{} ({:.2}, led by {}: {}) over {} ({:.2}, led by {}: {})",
            self.winner,
            self.winner_support,
            self.winner_lead,
            metrics(&self.winner_metrics),
            self.runner_up,
            self.runner_up_support,
            self.runner_up_lead,
            metrics(&self.runner_up_metrics),
        )
    }
}

/// Final, arbitrated recommendation for one (entity, market).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub entity_id: EntityId,
    pub market: Market,
    pub recommendation: Recommendation,
    /// Confidence after ensemble resolution.
    pub confidence: f64,
    pub contributors: Vec<Contribution>,
    pub conflict_resolved: bool,
    pub explanation: Option<ConflictExplanation>,
}
