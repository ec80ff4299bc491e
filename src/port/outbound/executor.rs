//! Strategy execution port.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::configuration::StrategyConfiguration;
use crate::domain::id::StrategyId;
use crate::domain::signal::CandidateSignal;
use crate::error::Result;

/// Invokes a strategy's domain logic to obtain raw candidate signals.
///
/// The engine calls this once per enabled strategy per cycle, concurrently,
/// under a per-strategy timeout. Returned confidences are raw; the engine
/// applies the configured multiplier and threshold.
#[async_trait]
pub trait StrategyExecutor: Send + Sync {
    async fn execute_strategy(
        &self,
        strategy_id: &StrategyId,
        config: &StrategyConfiguration,
        horizon: Duration,
    ) -> Result<Vec<CandidateSignal>>;
}
