//! Handler for the `history` command.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::id::StrategyId;
use crate::error::Result;
use crate::port::inbound::control::StrategyControl;
use crate::port::outbound::store::HistoryEntry;

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Cap/day")]
    cap: u32,
    #[tabled(rename = "Trigger")]
    trigger: &'static str,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        let config = &entry.configuration;
        Self {
            version: config.version.to_string(),
            published: config.derived_at.format("%m-%d %H:%M").to_string(),
            strategy: config.strategy_id.to_string(),
            status: output::status(config.status),
            weight: format!("{:.2}", config.ensemble_weight()),
            cap: config.max_emissions_per_period(),
            trigger: entry.trigger.as_str(),
        }
    }
}

/// Execute the history command.
///
/// # Errors
///
/// Returns an error if the configuration store cannot be queried.
pub async fn execute(
    control: &dyn StrategyControl,
    strategy: Option<&str>,
    days: u32,
) -> Result<()> {
    let strategy_id = strategy.map(StrategyId::new);
    let entries = control
        .get_configuration_history(strategy_id.as_ref(), days)
        .await?;

    if output::is_json() {
        output::json_output(&json!({
            "command": "history",
            "strategy": strategy,
            "days": days,
            "entries": entries,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::section(&format!("Configuration history ({days}d)"));
    if entries.is_empty() {
        output::hint("nothing published in this window");
        return Ok(());
    }
    let rows: Vec<HistoryRow> = entries.iter().map(HistoryRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
