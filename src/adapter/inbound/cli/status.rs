//! Handler for the `status` command.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::configuration::StrategyConfiguration;
use crate::domain::live::LiveConfiguration;
use crate::error::Result;
use crate::port::inbound::control::StrategyControl;

#[derive(Tabled)]
struct ConfigurationRow {
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Multiplier")]
    multiplier: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Cap/day")]
    cap: u32,
}

impl From<&StrategyConfiguration> for ConfigurationRow {
    fn from(config: &StrategyConfiguration) -> Self {
        let staged = config.staged_tuning();
        Self {
            strategy: config.strategy_id.to_string(),
            status: output::status(config.status),
            enabled: if config.is_enabled() { "yes" } else { "no" },
            multiplier: staged.map_or_else(|| "-".into(), |t| format!("{:.2}", t.confidence_multiplier)),
            threshold: format!("{:+.3}", config.threshold_adjustment()),
            weight: format!("{:.2}", config.ensemble_weight()),
            cap: config.max_emissions_per_period(),
        }
    }
}

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if the live configuration cannot be produced.
pub async fn execute(control: &dyn StrategyControl) -> Result<()> {
    let live = control.get_live_configuration(true).await?;

    if output::is_json() {
        output::json_output(&to_json(&live));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    let state = &live.state;
    let summary = state.summary();

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Version", output::highlight(state.version));
    output::field("Derived", state.derived_at.format("%Y-%m-%d %H:%M:%S UTC"));
    output::field("Trigger", state.trigger.as_str());
    output::field(
        "Strategies",
        format!("{} total, {} enabled", summary.total, summary.enabled),
    );
    match live.degraded_reason {
        Some(reason) if live.degraded => output::warning(&format!("Degraded: {}", reason.as_str())),
        _ => output::success("Serving a persisted, performance-backed configuration"),
    }

    if state.configurations.is_empty() {
        output::hint("no strategies yet; register one or add [[strategies]] to the config");
        return Ok(());
    }

    output::section("Configurations");
    let rows: Vec<ConfigurationRow> = state
        .enabled()
        .chain(state.disabled())
        .map(ConfigurationRow::from)
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

fn to_json(live: &LiveConfiguration) -> serde_json::Value {
    let state = &live.state;
    json!({
        "command": "status",
        "version": state.version,
        "derived_at": state.derived_at,
        "trigger": state.trigger,
        "origin": state.origin,
        "degraded": live.degraded,
        "degraded_reason": live.degraded_reason,
        "summary": state.summary(),
        "enabled": state.enabled().collect::<Vec<_>>(),
        "disabled": state.disabled().collect::<Vec<_>>(),
    })
}
