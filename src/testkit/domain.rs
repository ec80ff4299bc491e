//! Builders for domain values and a fully wired engine over in-memory fakes.
//!
//! Tests focus on assertions rather than construction boilerplate: every
//! [`Harness`] owns handles to its fakes so a test can script inputs, drive
//! the clock and inspect what was persisted or notified.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::application::engine::{Engine, EngineConfig, EngineDeps, ExecutionPolicy, RetryPolicy};
use crate::domain::category::StrategyCategory;
use crate::domain::id::{EntityId, Market, Recommendation, StrategyId};
use crate::domain::performance::PerformanceRecord;
use crate::domain::signal::CandidateSignal;
use crate::port::outbound::clock::Clock;
use crate::port::outbound::notifier::NotifierRegistry;

use super::clock::ManualClock;
use super::executor::ScriptedExecutor;
use super::notifier::RecordingNotifier;
use super::performance::ScriptedPerformanceSource;
use super::store::InMemoryConfigurationStore;

/// A performance row.
pub fn record(
    id: &str,
    win_rate: f64,
    roi: f64,
    sample_size: u32,
    observed_at: DateTime<Utc>,
) -> PerformanceRecord {
    PerformanceRecord {
        strategy_id: StrategyId::new(id),
        win_rate,
        roi,
        sample_size,
        consecutive_losses: 0,
        observed_at,
        source_partition: "test".to_string(),
    }
}

/// Comfortably ACTIVE with a robust sample (62% win rate, +12% ROI, n=60).
pub fn healthy(id: &str, observed_at: DateTime<Utc>) -> PerformanceRecord {
    record(id, 0.62, 12.0, 60, observed_at)
}

/// Deep in QUARANTINE territory (40% win rate, -15% ROI, n=60).
pub fn losing(id: &str, observed_at: DateTime<Utc>) -> PerformanceRecord {
    record(id, 0.40, -15.0, 60, observed_at)
}

/// A candidate signal.
pub fn signal(
    strategy: &str,
    entity: &str,
    market: &str,
    recommendation: &str,
    confidence: f64,
) -> CandidateSignal {
    CandidateSignal {
        entity_id: EntityId::new(entity),
        market: Market::new(market),
        strategy_id: StrategyId::new(strategy),
        recommendation: Recommendation::new(recommendation),
        strength: 1.0,
        confidence,
    }
}

/// Retries that back off in milliseconds, not seconds.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
    }
}

/// Engine defaults with fast retries and short execution budgets.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        retry: fast_retry(),
        execution: ExecutionPolicy {
            strategy_timeout: Duration::from_millis(200),
            cycle_timeout: Duration::from_secs(2),
            ..ExecutionPolicy::default()
        },
        ..EngineConfig::default()
    }
}

/// Declared strategies for [`EngineConfig::strategies`].
pub fn declared(ids: &[&str]) -> Vec<(StrategyId, StrategyCategory)> {
    ids.iter()
        .map(|id| (StrategyId::new(*id), StrategyCategory::Statistical))
        .collect()
}

/// An engine wired to fakes, plus handles to each fake.
pub struct Harness {
    pub engine: Arc<Engine>,
    pub clock: Arc<ManualClock>,
    pub performance: Arc<ScriptedPerformanceSource>,
    pub executor: Arc<ScriptedExecutor>,
    pub store: Arc<InMemoryConfigurationStore>,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(
            config,
            Arc::new(InMemoryConfigurationStore::new()),
            Arc::new(ManualClock::at_noon()),
        )
    }

    /// A second engine over this harness's store and clock, as after a
    /// process restart.
    pub fn restarted(&self, config: EngineConfig) -> Self {
        Self::build(config, Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    fn build(
        config: EngineConfig,
        store: Arc<InMemoryConfigurationStore>,
        clock: Arc<ManualClock>,
    ) -> Self {
        let performance = Arc::new(ScriptedPerformanceSource::new());
        let executor = Arc::new(ScriptedExecutor::new());
        let notifier = RecordingNotifier::new();

        let mut notifiers = NotifierRegistry::new();
        notifiers.register(Box::new(notifier.clone()));

        let engine = Engine::new(
            config,
            EngineDeps {
                performance: Arc::clone(&performance) as _,
                executor: Arc::clone(&executor) as _,
                store: Arc::clone(&store) as _,
                notifiers: Arc::new(notifiers),
                clock: Arc::clone(&clock) as _,
            },
        );

        Self {
            engine: Arc::new(engine),
            clock,
            performance,
            executor,
            store,
            notifier,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
