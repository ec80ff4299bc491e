//! Handlers for the operator controls: kill switch, registration, lifecycle
//! overrides and gate checks.

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::domain::category::StrategyCategory;
use crate::domain::id::StrategyId;
use crate::error::Result;
use crate::port::inbound::control::StrategyControl;

/// Throw the kill switch.
///
/// # Errors
///
/// Returns an error if the action could not be audited.
pub async fn kill_switch_on(control: &dyn StrategyControl, by: &str, reason: &str) -> Result<()> {
    control.activate_kill_switch(by, reason).await?;
    if output::is_json() {
        output::json_output(&json!({ "command": "kill-switch", "active": true, "by": by }));
    } else {
        output::warning(&format!("Kill switch ACTIVE ({reason}), all gate checks blocked"));
    }
    Ok(())
}

/// Release the kill switch.
///
/// # Errors
///
/// Returns an error if the action could not be audited.
pub async fn kill_switch_off(control: &dyn StrategyControl, by: &str) -> Result<()> {
    control.deactivate_kill_switch(by).await?;
    if output::is_json() {
        output::json_output(&json!({ "command": "kill-switch", "active": false, "by": by }));
    } else {
        output::success("Kill switch released");
    }
    Ok(())
}

/// Register a strategy.
///
/// # Errors
///
/// Returns an error if the registration could not be written.
pub async fn register(
    control: &dyn StrategyControl,
    id: &str,
    category: StrategyCategory,
) -> Result<()> {
    let created = control
        .register_strategy(&StrategyId::new(id), category)
        .await?;
    if output::is_json() {
        output::json_output(&json!({
            "command": "register",
            "strategy": id,
            "category": category,
            "created": created,
        }));
    } else if created {
        output::success(&format!("Registered {id} ({category}) on probation"));
    } else {
        output::field("Unchanged", format!("{id} is already registered"));
    }
    Ok(())
}

/// Promote a strategy to ACTIVE.
///
/// # Errors
///
/// Returns an error if the strategy is unknown or the override fails.
pub async fn promote(control: &dyn StrategyControl, id: &str, by: &str) -> Result<()> {
    control.promote_strategy(&StrategyId::new(id), by).await?;
    if output::is_json() {
        output::json_output(&json!({ "command": "promote", "strategy": id, "by": by }));
    } else {
        output::success(&format!("{id} promoted to active by {by}"));
    }
    Ok(())
}

/// Deprecate a strategy.
///
/// # Errors
///
/// Returns an error if the strategy is unknown or the override fails.
pub async fn deprecate(
    control: &dyn StrategyControl,
    id: &str,
    by: &str,
    reason: &str,
) -> Result<()> {
    control
        .deprecate_strategy(&StrategyId::new(id), by, reason)
        .await?;
    if output::is_json() {
        output::json_output(&json!({
            "command": "deprecate",
            "strategy": id,
            "by": by,
            "reason": reason,
        }));
    } else {
        output::success(&format!("{id} deprecated by {by}"));
    }
    Ok(())
}

/// Report what the gate would say for a strategy. Approval consumes one
/// emission from today's allowance.
pub fn gate(control: &dyn StrategyControl, id: &str) {
    let result = control.check_gate(&StrategyId::new(id));
    if output::is_json() {
        output::json_output(&json!({ "command": "gate", "strategy": id, "result": result }));
        return;
    }
    if result.allowed {
        output::success(&format!(
            "{id} approved (cap {}, confidence x{:.2})",
            result.max_emissions, result.confidence_scale
        ));
    } else {
        let recoverable = if result.is_recoverable() {
            " (recoverable)"
        } else {
            ""
        };
        output::warning(&format!("{id} blocked: {}{recoverable}", result.reason));
    }
}
