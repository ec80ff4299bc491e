//! Handler for the `run` command.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::application::engine::{CycleReport, Engine, EngineService};
use crate::error::Result;

/// Execute the run command against an initialized engine.
///
/// With `--once`, force one refresh and one execution cycle, then exit.
/// Otherwise run the engine loop until ctrl-c.
///
/// # Errors
///
/// Returns an error if the one-shot refresh fails or the signal handler
/// cannot be installed.
pub async fn execute(engine: Arc<Engine>, args: &RunArgs) -> Result<()> {
    if args.once {
        let outcome = engine.poll(true).await?;
        if let Some(outcome) = outcome {
            info!(
                version = %outcome.version,
                published = outcome.published,
                duration_ms = outcome.duration_ms,
                "One-shot refresh complete"
            );
        }
        let report = engine.run_cycle().await;
        print_report(&report);
        return Ok(());
    }

    let config = engine.config();
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Version", output::highlight(engine.live_configuration().version()));
    output::field("Strategies", config.strategies.len());
    output::field("Poll every", format!("{}s", config.poll_interval.as_secs()));
    output::hint("press ctrl-c to stop");

    let (handle, mut reports) = EngineService::new(Arc::clone(&engine)).start();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for ctrl-c");
                }
                info!("Shutdown requested");
                break;
            }
            report = reports.recv() => {
                let Some(report) = report else {
                    warn!("Engine loop exited");
                    break;
                };
                print_report(&report);
            }
        }
    }

    handle.shutdown().await;
    output::success("Engine stopped");
    Ok(())
}

fn print_report(report: &CycleReport) {
    if output::is_json() {
        output::json_output(&json!({
            "command": "run",
            "version": report.version,
            "executed": report.executed,
            "blocked": report.blocked,
            "failed": report.failed,
            "timed_out": report.timed_out,
            "abandoned": report.abandoned,
            "signals": report.signals,
            "decisions": report.decisions,
        }));
        return;
    }
    if output::is_quiet() {
        return;
    }

    output::section(&format!("Cycle {}", report.version));
    output::field(
        "Strategies",
        format!(
            "{} ran, {} blocked, {} failed, {} timed out",
            report.executed, report.blocked, report.failed, report.timed_out
        ),
    );
    output::field("Signals", report.signals);
    for decision in &report.decisions {
        let line = format!(
            "{} {} -> {} ({:.2})",
            decision.entity_id, decision.market, decision.recommendation, decision.confidence
        );
        output::field("Decision", line);
        if output::verbosity() > 0 {
            if let Some(explanation) = &decision.explanation {
                output::hint(&explanation.to_string());
            }
        }
    }
}
