//! Handler for the `check` command.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;

use crate::adapter::inbound::cli::output;

/// What a configuration check found. Built by the caller after the
/// configuration loaded and the database opened.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub config_path: PathBuf,
    /// False when built-in defaults were used.
    pub config_found: bool,
    pub database: String,
    pub strategies: usize,
    pub fallback: Vec<String>,
    pub signals_dir: Option<String>,
}

/// Print a configuration check report.
pub fn execute(report: &CheckReport) {
    if output::is_json() {
        output::json_output(&json!({ "command": "check", "report": report }));
        return;
    }

    output::section("Configuration Check");
    if report.config_found {
        output::field("Config", report.config_path.display());
        output::success("Configuration file is valid");
    } else {
        output::field("Config", "built-in defaults");
        output::hint(&format!("no file at {}", report.config_path.display()));
    }

    output::section("Summary");
    output::field("Database", &report.database);
    output::field("Strategies", report.strategies);
    let fallback = if report.fallback.is_empty() {
        "none".to_string()
    } else {
        report.fallback.join(", ")
    };
    output::field("Fallback", fallback);
    match &report.signals_dir {
        Some(dir) => output::field("Signals", dir),
        None => output::warning("No signals_dir set, strategies run dry"),
    }
    if report.strategies == 0 && report.fallback.is_empty() {
        output::warning("No strategies declared and no fallback set");
    }

    output::success("Database reachable and migrated");
}
