//! Operator-facing capabilities of the engine.

use async_trait::async_trait;
use chrono::Duration;
use tracing::{info, warn};

use crate::domain::alert::{Alert, AlertLevel, KillSwitchAction, KillSwitchAudit};
use crate::domain::category::StrategyCategory;
use crate::domain::id::{AlertId, StrategyId};
use crate::domain::lifecycle::{LifecycleEvent, LifecycleStatus, TransitionReason};
use crate::domain::live::LiveConfiguration;
use crate::domain::trigger::TriggerKind;
use crate::error::{EngineError, Result};
use crate::port::inbound::control::StrategyControl;
use crate::port::inbound::gate::GateResult;
use crate::port::outbound::notifier::Event;
use crate::port::outbound::store::{HistoryEntry, HistoryQuery};

use super::Engine;

impl Engine {
    /// Write a kill-switch action with retries. An action that cannot be
    /// audited raises a critical alert; the in-memory switch already moved.
    async fn audit_kill_switch(&self, audit: KillSwitchAudit) -> Result<()> {
        let written = self
            .config
            .retry
            .run("record_kill_switch", || self.store.record_kill_switch(&audit))
            .await;
        self.notifiers.notify_all(Event::KillSwitch(audit.clone()));
        if let Err(err) = written {
            self.raise(
                None,
                AlertLevel::Critical,
                format!(
                    "kill switch {} by {} was not audited: {err}",
                    audit.action.as_str(),
                    audit.actor
                ),
            )
            .await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Force `strategy_id` into `status`, audit it, then republish without
    /// re-evaluating, so the override is live immediately.
    async fn override_status(
        &self,
        strategy_id: &StrategyId,
        status: LifecycleStatus,
        reason: TransitionReason,
    ) -> Result<()> {
        let guard = self.refresh_lock.lock().await;
        let mut entry = self
            .registry
            .get(strategy_id)
            .ok_or_else(|| EngineError::UnknownStrategy(strategy_id.clone()))?;

        let previous = entry.status;
        let now = self.clock.now();
        entry.status = status;
        entry.cleared_since = None;
        entry.counters.cycles_below_probation = 0;
        if status == LifecycleStatus::Active {
            entry.onboarding = false;
        }
        if previous != status {
            entry.counters.transitions += 1;
        }

        let event = LifecycleEvent {
            strategy_id: strategy_id.clone(),
            previous_status: Some(previous),
            new_status: status,
            reason,
            performance: self
                .state
                .snapshot()
                .metrics
                .get(strategy_id)
                .map(|r| r.snapshot()),
            timestamp: now,
        };
        self.store.upsert_strategy(&entry).await?;
        self.store.append_event(&event).await?;
        self.registry.upsert(entry);
        info!(
            strategy = %strategy_id,
            from = %previous,
            to = %status,
            reason = %event.reason,
            "Manual lifecycle override"
        );
        self.notifiers.notify_all(Event::StatusChanged(event));

        if let Err(e) = self.republish_locked(TriggerKind::ManualOverride).await {
            warn!(strategy = %strategy_id, error = %e, "Refresh after override failed");
        }
        drop(guard);
        Ok(())
    }
}

#[async_trait]
impl StrategyControl for Engine {
    async fn get_live_configuration(&self, force_refresh: bool) -> Result<LiveConfiguration> {
        if force_refresh {
            if let Err(e) = self.refresh(TriggerKind::ManualOverride).await {
                warn!(error = %e, "Forced refresh failed, serving last valid configuration");
            }
        }
        Ok(self.live_configuration())
    }

    fn check_gate(&self, strategy_id: &StrategyId) -> GateResult {
        self.gate.check(strategy_id)
    }

    async fn activate_kill_switch(&self, by: &str, reason: &str) -> Result<()> {
        self.state.activate_kill_switch(reason);
        warn!(by, reason, "Kill switch activated");
        self.audit_kill_switch(KillSwitchAudit {
            action: KillSwitchAction::Activated,
            actor: by.to_string(),
            reason: Some(reason.to_string()),
            at: self.clock.now(),
        })
        .await
    }

    async fn deactivate_kill_switch(&self, by: &str) -> Result<()> {
        self.state.deactivate_kill_switch();
        info!(by, "Kill switch deactivated");
        self.audit_kill_switch(KillSwitchAudit {
            action: KillSwitchAction::Deactivated,
            actor: by.to_string(),
            reason: None,
            at: self.clock.now(),
        })
        .await
    }

    async fn register_strategy(
        &self,
        strategy_id: &StrategyId,
        category: StrategyCategory,
    ) -> Result<bool> {
        self.register_durably(strategy_id, category, self.clock.now())
            .await
    }

    async fn get_configuration_history(
        &self,
        strategy_id: Option<&StrategyId>,
        days: u32,
    ) -> Result<Vec<HistoryEntry>> {
        let query = HistoryQuery {
            strategy_id: strategy_id.cloned(),
            since: self.clock.now() - Duration::days(i64::from(days)),
        };
        self.store.configuration_history(&query).await
    }

    async fn promote_strategy(&self, strategy_id: &StrategyId, by: &str) -> Result<()> {
        let reason = TransitionReason::Manual {
            by: by.to_string(),
            note: "promoted".to_string(),
        };
        self.override_status(strategy_id, LifecycleStatus::Active, reason)
            .await
    }

    async fn deprecate_strategy(
        &self,
        strategy_id: &StrategyId,
        by: &str,
        reason: &str,
    ) -> Result<()> {
        let reason = TransitionReason::Manual {
            by: by.to_string(),
            note: reason.to_string(),
        };
        self.override_status(strategy_id, LifecycleStatus::Deprecated, reason)
            .await
    }

    async fn alerts(&self, unacknowledged_only: bool) -> Result<Vec<Alert>> {
        self.store.alerts(unacknowledged_only).await
    }

    async fn acknowledge_alert(&self, id: &AlertId) -> Result<bool> {
        let found = self.store.acknowledge_alert(id).await?;
        if found {
            info!(alert = %id, "Alert acknowledged");
        }
        Ok(found)
    }
}
