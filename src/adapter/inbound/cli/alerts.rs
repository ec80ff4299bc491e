//! Handlers for `alerts list` and `alerts ack`.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::alert::Alert;
use crate::domain::id::AlertId;
use crate::error::Result;
use crate::port::inbound::control::StrategyControl;

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Raised")]
    raised: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Ack")]
    acknowledged: &'static str,
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id.to_string(),
            raised: alert.raised_at.format("%Y-%m-%d %H:%M").to_string(),
            level: alert.level.to_string(),
            strategy: alert
                .strategy_id
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            message: alert.message.clone(),
            acknowledged: if alert.acknowledged { "yes" } else { "" },
        }
    }
}

/// List alerts, unacknowledged only unless `all`.
///
/// # Errors
///
/// Returns an error if the store cannot be queried.
pub async fn list(control: &dyn StrategyControl, all: bool) -> Result<()> {
    let alerts = control.alerts(!all).await?;
    if output::is_json() {
        output::json_output(&json!({ "command": "alerts.list", "alerts": alerts }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }
    output::section("Alerts");
    if alerts.is_empty() {
        output::success("No open alerts");
        return Ok(());
    }
    let rows: Vec<AlertRow> = alerts.iter().map(AlertRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    output::hint("acknowledge with `stratagem alerts ack <id>`");
    Ok(())
}

/// Acknowledge one alert.
///
/// # Errors
///
/// Returns an error if the store cannot be updated.
pub async fn acknowledge(control: &dyn StrategyControl, id: &str) -> Result<()> {
    let found = control.acknowledge_alert(&AlertId::from(id.to_string())).await?;
    if output::is_json() {
        output::json_output(&json!({ "command": "alerts.ack", "id": id, "found": found }));
    } else if found {
        output::success(&format!("Alert {id} acknowledged"));
    } else {
        output::warning(&format!("No alert with id {id}"));
    }
    Ok(())
}
