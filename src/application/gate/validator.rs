//! Per-call validation gate.
//!
//! Checks short-circuit in order: kill switch, registration, lifecycle
//! status, circuit breaker, daily emission cap. On approval the per-day
//! counter is incremented under the same entry lock that read it, so
//! concurrent callers can never exceed the cap.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::application::registry::StrategyRegistry;
use crate::application::state::EngineState;
use crate::domain::id::StrategyId;
use crate::domain::lifecycle::LifecycleStatus;
use crate::port::inbound::gate::{GateReason, GateResult};
use crate::port::outbound::clock::Clock;

#[derive(Debug, Clone, Copy)]
struct DailyCounter {
    date: NaiveDate,
    count: u32,
}

pub struct ValidationGate {
    state: Arc<EngineState>,
    registry: Arc<StrategyRegistry>,
    clock: Arc<dyn Clock>,
    /// Approved checks per strategy for the current UTC date.
    counters: DashMap<StrategyId, DailyCounter>,
}

impl ValidationGate {
    pub fn new(
        state: Arc<EngineState>,
        registry: Arc<StrategyRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            registry,
            clock,
            counters: DashMap::new(),
        }
    }

    /// Check whether `strategy_id` may emit now, consuming one emission on
    /// approval.
    #[must_use]
    pub fn check(&self, strategy_id: &StrategyId) -> GateResult {
        if self.state.is_kill_switch_active() {
            debug!(strategy = %strategy_id, "Gate blocked by kill switch");
            return GateResult::blocked(GateReason::KillSwitchActive);
        }

        if !self.registry.contains(strategy_id) {
            warn!(strategy = %strategy_id, "Gate check for unregistered strategy");
            return GateResult::blocked(GateReason::Unregistered);
        }

        let snapshot = self.state.snapshot();
        let config = snapshot.get(strategy_id);
        let status = config
            .map(|c| c.status)
            .or_else(|| self.registry.status(strategy_id))
            .unwrap_or(LifecycleStatus::Probation);

        match status {
            LifecycleStatus::CircuitBreakerOpen => {
                return GateResult::blocked(GateReason::CircuitBreakerOpen);
            }
            LifecycleStatus::Active => {}
            other => return GateResult::blocked(GateReason::Inactive { status: other }),
        }

        let Some(tuning) = config.and_then(|c| c.tuning()) else {
            return GateResult::blocked(GateReason::Inactive { status });
        };
        let cap = tuning.max_emissions_per_period;
        let today = self.clock.now().date_naive();

        {
            let mut counter = self
                .counters
                .entry(strategy_id.clone())
                .or_insert(DailyCounter {
                    date: today,
                    count: 0,
                });
            if counter.date != today {
                *counter = DailyCounter {
                    date: today,
                    count: 0,
                };
            }
            if counter.count >= cap {
                debug!(strategy = %strategy_id, cap, "Daily emission cap reached");
                return GateResult::blocked(GateReason::EmissionCapReached { cap });
            }
            counter.count += 1;
        }

        self.registry.record_emission(strategy_id);
        GateResult::approved(cap, tuning.confidence_multiplier)
    }

    /// Approved checks for `strategy_id` so far today.
    #[must_use]
    pub fn emissions_today(&self, strategy_id: &StrategyId) -> u32 {
        let today = self.clock.now().date_naive();
        self.counters
            .get(strategy_id)
            .filter(|c| c.date == today)
            .map_or(0, |c| c.count)
    }
}
