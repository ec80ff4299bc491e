//! Engine capabilities exposed to callers and operators.

use async_trait::async_trait;

use crate::domain::alert::Alert;
use crate::domain::category::StrategyCategory;
use crate::domain::id::{AlertId, StrategyId};
use crate::domain::live::LiveConfiguration;
use crate::error::Result;
use crate::port::outbound::store::HistoryEntry;

use super::gate::GateResult;

/// Driving port implemented by the engine.
///
/// Every mutation here is audited in the configuration store.
#[async_trait]
pub trait StrategyControl: Send + Sync {
    /// Latest valid configuration, refreshing first when `force_refresh` is set.
    ///
    /// Never fails because the performance store is down; the response is
    /// flagged degraded instead.
    async fn get_live_configuration(&self, force_refresh: bool) -> Result<LiveConfiguration>;

    /// Whether `strategy_id` may act now. An approved check consumes one
    /// emission from today's allowance.
    fn check_gate(&self, strategy_id: &StrategyId) -> GateResult;

    async fn activate_kill_switch(&self, by: &str, reason: &str) -> Result<()>;

    async fn deactivate_kill_switch(&self, by: &str) -> Result<()>;

    /// Register a strategy. Returns `false` if it was already known.
    async fn register_strategy(
        &self,
        strategy_id: &StrategyId,
        category: StrategyCategory,
    ) -> Result<bool>;

    /// Configuration versions recorded over the last `days` days.
    async fn get_configuration_history(
        &self,
        strategy_id: Option<&StrategyId>,
        days: u32,
    ) -> Result<Vec<HistoryEntry>>;

    /// Force a strategy to ACTIVE.
    async fn promote_strategy(&self, strategy_id: &StrategyId, by: &str) -> Result<()>;

    /// Retire a strategy; automatic evaluation no longer moves it.
    async fn deprecate_strategy(&self, strategy_id: &StrategyId, by: &str, reason: &str)
        -> Result<()>;

    async fn alerts(&self, unacknowledged_only: bool) -> Result<Vec<Alert>>;

    async fn acknowledge_alert(&self, id: &AlertId) -> Result<bool>;
}
