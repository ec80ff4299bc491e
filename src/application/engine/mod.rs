//! Engine orchestration.
//!
//! The engine wires the pure components (evaluator, builder, bootstrapper,
//! arbiter, trigger controller) to the outbound ports and owns the shared
//! state behind the gate.

mod control;
mod execution;
mod refresh;
mod retry;
mod service;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::application::configuration::{
    BootstrapPolicy, BuilderPolicy, ColdStartBootstrapper, ConfigurationBuilder,
};
use crate::application::ensemble::EnsembleArbiter;
use crate::application::gate::ValidationGate;
use crate::application::lifecycle::{LifecycleEvaluator, LifecycleThresholds};
use crate::application::registry::StrategyRegistry;
use crate::application::state::EngineState;
use crate::application::trigger::{TriggerPolicy, UpdateTriggerController};
use crate::domain::alert::{Alert, AlertLevel, KillSwitchAction};
use crate::domain::category::StrategyCategory;
use crate::domain::configuration::ConfigurationVersion;
use crate::domain::id::StrategyId;
use crate::domain::lifecycle::{LifecycleEvent, TransitionReason};
use crate::domain::strategy::StrategyEntry;
use crate::domain::trigger::TriggerKind;
use crate::error::Result;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::executor::StrategyExecutor;
use crate::port::outbound::notifier::{Event, NotifierRegistry};
use crate::port::outbound::performance::PerformanceSource;
use crate::port::outbound::store::ConfigurationStore;

pub use execution::{CycleReport, ExecutionPolicy};
pub use refresh::RefreshOutcome;
pub use retry::RetryPolicy;
pub use service::{EngineHandle, EngineService};

/// Everything tunable about the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub thresholds: LifecycleThresholds,
    pub builder: BuilderPolicy,
    pub bootstrap: BootstrapPolicy,
    pub trigger: TriggerPolicy,
    pub execution: ExecutionPolicy,
    pub retry: RetryPolicy,
    /// How far back performance rows are read.
    pub lookback: chrono::Duration,
    pub poll_interval: Duration,
    /// Strategies registered at startup.
    pub strategies: Vec<(StrategyId, StrategyCategory)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: LifecycleThresholds::default(),
            builder: BuilderPolicy::default(),
            bootstrap: BootstrapPolicy::default(),
            trigger: TriggerPolicy::default(),
            execution: ExecutionPolicy::default(),
            retry: RetryPolicy::default(),
            lookback: chrono::Duration::days(30),
            poll_interval: Duration::from_secs(30),
            strategies: Vec::new(),
        }
    }
}

/// Outbound collaborators.
pub struct EngineDeps {
    pub performance: Arc<dyn PerformanceSource>,
    pub executor: Arc<dyn StrategyExecutor>,
    pub store: Arc<dyn ConfigurationStore>,
    pub notifiers: Arc<NotifierRegistry>,
    pub clock: Arc<dyn Clock>,
}

pub struct Engine {
    config: EngineConfig,
    evaluator: LifecycleEvaluator,
    builder: ConfigurationBuilder,
    bootstrapper: ColdStartBootstrapper,
    arbiter: EnsembleArbiter,
    state: Arc<EngineState>,
    registry: Arc<StrategyRegistry>,
    gate: ValidationGate,
    trigger: Mutex<UpdateTriggerController>,
    /// Serializes refreshes and manual lifecycle overrides.
    refresh_lock: tokio::sync::Mutex<()>,
    /// Highest version handed out, persisted or not. Never reused.
    allocated: Mutex<ConfigurationVersion>,
    performance: Arc<dyn PerformanceSource>,
    executor: Arc<dyn StrategyExecutor>,
    store: Arc<dyn ConfigurationStore>,
    notifiers: Arc<NotifierRegistry>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig, deps: EngineDeps) -> Self {
        let state = Arc::new(EngineState::new(deps.clock.now()));
        let registry = Arc::new(StrategyRegistry::new());
        let gate = ValidationGate::new(
            Arc::clone(&state),
            Arc::clone(&registry),
            Arc::clone(&deps.clock),
        );

        Self {
            evaluator: LifecycleEvaluator::new(config.thresholds.clone()),
            builder: ConfigurationBuilder::new(config.builder.clone()),
            bootstrapper: ColdStartBootstrapper::new(config.bootstrap.clone()),
            arbiter: EnsembleArbiter::new(config.execution.min_signal_confidence),
            trigger: Mutex::new(UpdateTriggerController::new(config.trigger.clone())),
            refresh_lock: tokio::sync::Mutex::new(()),
            allocated: Mutex::new(ConfigurationVersion::INITIAL),
            state,
            registry,
            gate,
            performance: deps.performance,
            executor: deps.executor,
            store: deps.store,
            notifiers: deps.notifiers,
            clock: deps.clock,
            config,
        }
    }

    /// Restore durable state and publish the first configuration.
    ///
    /// Runs [`Engine::restore`], then a startup refresh. A failed startup
    /// refresh is logged, not returned; the engine keeps serving the empty
    /// degraded snapshot until a later refresh lands.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration store cannot be read.
    pub async fn initialize(&self) -> Result<()> {
        self.restore().await?;
        if let Err(e) = self.refresh(TriggerKind::Startup).await {
            warn!(error = %e, "Startup refresh failed");
        }
        Ok(())
    }

    /// Load the registry, resume the version counter and kill switch from
    /// the store, and register configured strategies. Publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration store cannot be read or a
    /// registration cannot be written.
    pub async fn restore(&self) -> Result<()> {
        let entries = self.store.load_strategies().await?;
        let restored = entries.len();
        self.registry.commit(entries);

        if let Some(version) = self.store.latest_version().await? {
            let mut allocated = self.allocated.lock();
            *allocated = (*allocated).max(version);
        }

        self.sync_kill_switch().await?;

        let now = self.clock.now();
        let mut registered = 0usize;
        for (id, category) in &self.config.strategies {
            if self.register_durably(id, *category, now).await? {
                registered += 1;
            }
        }

        info!(
            restored,
            registered,
            resume_version = self.allocated.lock().value(),
            "Engine state restored"
        );
        Ok(())
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    #[must_use]
    pub const fn gate(&self) -> &ValidationGate {
        &self.gate
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Adopt the most recent kill-switch action recorded by any process.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn sync_kill_switch(&self) -> Result<()> {
        let Some(audit) = self.store.latest_kill_switch().await? else {
            return Ok(());
        };
        let active = self.state.is_kill_switch_active();
        match audit.action {
            KillSwitchAction::Activated if !active => {
                let reason = audit.reason.unwrap_or_else(|| audit.actor.clone());
                warn!(by = %audit.actor, reason = %reason, "Kill switch restored from store");
                self.state.activate_kill_switch(reason);
            }
            KillSwitchAction::Deactivated if active => {
                info!(by = %audit.actor, "Kill switch cleared from store");
                self.state.deactivate_kill_switch();
            }
            _ => {}
        }
        Ok(())
    }

    /// Next unused version, strictly above everything published or allocated.
    fn allocate_version(&self) -> ConfigurationVersion {
        let mut allocated = self.allocated.lock();
        let next = (*allocated).max(self.state.version()).next();
        *allocated = next;
        next
    }

    /// Register `id` unless known. The in-memory entry is dropped again when
    /// it cannot be persisted, so a retry writes it.
    async fn register_durably(
        &self,
        id: &StrategyId,
        category: StrategyCategory,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let grace_days = self.config.thresholds.grace_days;
        let Some(entry) = self.registry.register(id, category, now, grace_days) else {
            return Ok(false);
        };
        if let Err(err) = self.persist_registration(&entry, now).await {
            self.registry.unregister(id);
            warn!(strategy = %id, error = %err, "Registration not persisted; rolled back");
            return Err(err);
        }
        Ok(true)
    }

    async fn persist_registration(&self, entry: &StrategyEntry, now: DateTime<Utc>) -> Result<()> {
        let event = LifecycleEvent {
            strategy_id: entry.id.clone(),
            previous_status: None,
            new_status: entry.status,
            reason: TransitionReason::Registered,
            performance: None,
            timestamp: now,
        };
        self.store.upsert_strategy(entry).await?;
        self.store.append_event(&event).await?;
        info!(
            strategy = %entry.id,
            category = %entry.category,
            status = %entry.status,
            "Strategy registered"
        );
        self.notifiers.notify_all(Event::StatusChanged(event));
        Ok(())
    }

    /// Log and notify an alert, then write it to the store best-effort.
    async fn raise_alert(&self, alert: Alert) {
        self.notifiers.notify_all(Event::AlertRaised(alert.clone()));
        if let Err(e) = self.store.raise_alert(&alert).await {
            warn!(error = %e, level = alert.level.as_str(), "Failed to store alert");
        }
    }

    async fn raise(&self, strategy_id: Option<StrategyId>, level: AlertLevel, message: String) {
        let alert = Alert::new(strategy_id, level, message, self.clock.now());
        self.raise_alert(alert).await;
    }
}
