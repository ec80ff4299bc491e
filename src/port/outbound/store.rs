//! Configuration store port.
//!
//! Durable home for versioned configuration snapshots and the audit trail
//! (update triggers, lifecycle events, alerts, kill-switch actions), plus the
//! strategy registry rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::alert::{Alert, KillSwitchAudit};
use crate::domain::configuration::{ConfigurationVersion, StrategyConfiguration};
use crate::domain::id::{AlertId, StrategyId};
use crate::domain::lifecycle::LifecycleEvent;
use crate::domain::strategy::StrategyEntry;
use crate::domain::trigger::{TriggerKind, TriggerRecord};
use crate::error::Result;

/// Everything one refresh cycle writes. Persisted atomically or not at all.
#[derive(Debug, Clone)]
pub struct SnapshotBatch {
    pub version: ConfigurationVersion,
    pub trigger: TriggerRecord,
    pub configurations: Vec<StrategyConfiguration>,
    pub events: Vec<LifecycleEvent>,
    /// Registry rows touched by the cycle.
    pub strategies: Vec<StrategyEntry>,
}

/// Filter for audit queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub strategy_id: Option<StrategyId>,
    pub since: DateTime<Utc>,
}

/// One strategy's configuration at one published version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub configuration: StrategyConfiguration,
    pub trigger: TriggerKind,
}

#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Write a cycle's batch in a single transaction.
    async fn persist_snapshot(&self, batch: &SnapshotBatch) -> Result<()>;

    /// Append a lifecycle event raised outside a refresh cycle.
    async fn append_event(&self, event: &LifecycleEvent) -> Result<()>;

    /// Insert or replace a registry row.
    async fn upsert_strategy(&self, entry: &StrategyEntry) -> Result<()>;

    async fn load_strategies(&self) -> Result<Vec<StrategyEntry>>;

    /// Highest version ever persisted, if any.
    async fn latest_version(&self) -> Result<Option<ConfigurationVersion>>;

    async fn configuration_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>>;

    async fn lifecycle_events(&self, query: &HistoryQuery) -> Result<Vec<LifecycleEvent>>;

    async fn raise_alert(&self, alert: &Alert) -> Result<()>;

    async fn alerts(&self, unacknowledged_only: bool) -> Result<Vec<Alert>>;

    /// Mark an alert acknowledged. Returns `false` if no such alert exists.
    async fn acknowledge_alert(&self, id: &AlertId) -> Result<bool>;

    async fn record_kill_switch(&self, audit: &KillSwitchAudit) -> Result<()>;

    /// Most recent kill-switch action, used to restore state across processes.
    async fn latest_kill_switch(&self) -> Result<Option<KillSwitchAudit>>;
}
