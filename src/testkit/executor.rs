//! Scripted strategy executor.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::configuration::StrategyConfiguration;
use crate::domain::id::StrategyId;
use crate::domain::signal::CandidateSignal;
use crate::error::{Error, Result};
use crate::port::outbound::executor::StrategyExecutor;

/// What one strategy does when executed.
#[derive(Debug, Clone)]
pub enum Script {
    Signals(Vec<CandidateSignal>),
    Fail(String),
    /// Sleep, then return the signals.
    Slow(Duration, Vec<CandidateSignal>),
}

/// Executor that plays back a [`Script`] per strategy. Unscripted strategies
/// return no signals.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<StrategyId, Script>>,
    calls: Mutex<Vec<StrategyId>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, id: &str, script: Script) {
        self.scripts.lock().insert(StrategyId::new(id), script);
    }

    /// Strategies executed so far, in call order.
    pub fn calls(&self) -> Vec<StrategyId> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StrategyExecutor for ScriptedExecutor {
    async fn execute_strategy(
        &self,
        strategy_id: &StrategyId,
        _config: &StrategyConfiguration,
        _horizon: Duration,
    ) -> Result<Vec<CandidateSignal>> {
        self.calls.lock().push(strategy_id.clone());
        let script = self.scripts.lock().get(strategy_id).cloned();
        match script {
            None => Ok(Vec::new()),
            Some(Script::Signals(signals)) => Ok(signals),
            Some(Script::Fail(reason)) => Err(Error::Parse(reason)),
            Some(Script::Slow(delay, signals)) => {
                tokio::time::sleep(delay).await;
                Ok(signals)
            }
        }
    }
}
