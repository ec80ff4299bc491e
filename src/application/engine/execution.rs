//! Execution cycle: run every enabled strategy concurrently, then arbitrate.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::domain::configuration::ConfigurationVersion;
use crate::domain::id::StrategyId;
use crate::domain::signal::{CandidateSignal, Decision};
use crate::error::EngineError;

use super::Engine;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPolicy {
    /// Budget for one strategy's execution.
    pub strategy_timeout: Duration,
    /// Soft budget for the whole cycle; whatever finished is arbitrated.
    pub cycle_timeout: Duration,
    /// How far ahead strategies look for opportunities.
    pub horizon: Duration,
    /// Raw confidence a signal needs before threshold adjustment.
    pub min_signal_confidence: f64,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            strategy_timeout: Duration::from_secs(10),
            cycle_timeout: Duration::from_secs(60),
            horizon: Duration::from_secs(24 * 60 * 60),
            min_signal_confidence: 0.5,
        }
    }
}

/// Result of one execution cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub version: ConfigurationVersion,
    pub executed: usize,
    /// Strategies the gate refused this cycle.
    pub blocked: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Tasks still running when the cycle deadline passed.
    pub abandoned: usize,
    pub signals: usize,
    pub decisions: Vec<Decision>,
}

enum TaskResult {
    Signals(Vec<CandidateSignal>),
    Failed(EngineError),
    TimedOut,
}

impl Engine {
    /// Run one execution cycle against the current snapshot.
    ///
    /// Each enabled strategy passes the gate, then executes in its own task
    /// with its own timeout. A failing or slow strategy contributes nothing
    /// and never aborts the cycle. Arbitration waits for every task, or for
    /// the soft cycle deadline, whichever comes first.
    pub async fn run_cycle(&self) -> CycleReport {
        let snapshot = self.state.snapshot();
        let policy = self.config.execution.clone();
        let mut report = CycleReport {
            version: snapshot.version,
            ..CycleReport::default()
        };

        let mut tasks: JoinSet<(StrategyId, TaskResult)> = JoinSet::new();
        for config in snapshot.enabled() {
            let gate = self.gate.check(&config.strategy_id);
            if !gate.allowed {
                debug!(strategy = %config.strategy_id, reason = %gate.reason, "Execution gated");
                report.blocked += 1;
                continue;
            }

            let executor = Arc::clone(&self.executor);
            let config = config.clone();
            let horizon = policy.horizon;
            let budget = policy.strategy_timeout;
            tasks.spawn(async move {
                let id = config.strategy_id.clone();
                let result = match timeout(
                    budget,
                    executor.execute_strategy(&id, &config, horizon),
                )
                .await
                {
                    Ok(Ok(signals)) => TaskResult::Signals(signals),
                    Ok(Err(e)) => TaskResult::Failed(EngineError::ExecutionFailure {
                        strategy_id: id.clone(),
                        reason: e.to_string(),
                    }),
                    Err(_) => TaskResult::TimedOut,
                };
                (id, result)
            });
        }

        let deadline = Instant::now() + policy.cycle_timeout;
        let mut candidates: Vec<CandidateSignal> = Vec::new();
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((id, result)))) => match result {
                    TaskResult::Signals(signals) => {
                        report.executed += 1;
                        let (own, foreign): (Vec<_>, Vec<_>) =
                            signals.into_iter().partition(|s| s.strategy_id == id);
                        if !foreign.is_empty() {
                            warn!(
                                strategy = %id,
                                foreign = foreign.len(),
                                "Dropped signals attributed to other strategies"
                            );
                        }
                        report.signals += own.len();
                        candidates.extend(own);
                    }
                    TaskResult::Failed(err) => {
                        warn!(error = %err, "Strategy skipped this cycle");
                        report.failed += 1;
                    }
                    TaskResult::TimedOut => {
                        warn!(
                            strategy = %id,
                            timeout_ms = policy.strategy_timeout.as_millis() as u64,
                            "Strategy execution timed out"
                        );
                        report.timed_out += 1;
                    }
                },
                Ok(Some(Err(join_err))) => {
                    warn!(error = %join_err, "Strategy task panicked");
                    report.failed += 1;
                }
                Err(_) => {
                    report.abandoned = tasks.len();
                    warn!(
                        abandoned = report.abandoned,
                        "Cycle deadline reached, arbitrating partial results"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        report.decisions = self.arbiter.decide(candidates, &snapshot);
        info!(
            version = report.version.value(),
            executed = report.executed,
            blocked = report.blocked,
            failed = report.failed,
            timed_out = report.timed_out,
            signals = report.signals,
            decisions = report.decisions.len(),
            "Execution cycle complete"
        );
        report
    }

    /// Arbitrate externally produced signals against the current snapshot.
    #[must_use]
    pub fn arbitrate(&self, raw: Vec<CandidateSignal>) -> Vec<Decision> {
        let snapshot = self.state.snapshot();
        self.arbiter.decide(raw, &snapshot)
    }
}
