//! Strategy executors.
//!
//! The signal math lives outside this crate. [`SignalFileExecutor`] picks up
//! candidate signals that external producers drop as JSON files, one file per
//! strategy. [`DryRunExecutor`] produces nothing and is used when no signal
//! directory is configured.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::configuration::StrategyConfiguration;
use crate::domain::id::StrategyId;
use crate::domain::signal::CandidateSignal;
use crate::error::Result;
use crate::port::outbound::executor::StrategyExecutor;

/// Executor that never emits signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl StrategyExecutor for DryRunExecutor {
    async fn execute_strategy(
        &self,
        strategy_id: &StrategyId,
        _config: &StrategyConfiguration,
        _horizon: Duration,
    ) -> Result<Vec<CandidateSignal>> {
        debug!(strategy = %strategy_id, "Dry run, no signals");
        Ok(Vec::new())
    }
}

/// Reads `<dir>/<strategy_id>.json`, a JSON array of candidate signals.
///
/// A missing file means the strategy has nothing to say this cycle. A file
/// that does not parse is an execution failure for that strategy only.
#[derive(Debug, Clone)]
pub struct SignalFileExecutor {
    dir: PathBuf,
}

impl SignalFileExecutor {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, strategy_id: &StrategyId) -> PathBuf {
        self.dir.join(format!("{strategy_id}.json"))
    }
}

#[async_trait]
impl StrategyExecutor for SignalFileExecutor {
    async fn execute_strategy(
        &self,
        strategy_id: &StrategyId,
        _config: &StrategyConfiguration,
        _horizon: Duration,
    ) -> Result<Vec<CandidateSignal>> {
        let path = self.path_for(strategy_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let signals: Vec<CandidateSignal> = serde_json::from_str(&content)?;
        debug!(
            strategy = %strategy_id,
            path = %path.display(),
            count = signals.len(),
            "Loaded signal file"
        );
        Ok(signals)
    }
}
