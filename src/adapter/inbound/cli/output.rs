//! Terminal output for CLI handlers.
//!
//! Every helper has two renderings: human-readable colored text, or one JSON
//! object per line (`{"type": ..., "payload": ...}`) when `--json` is set.
//! Quiet mode suppresses human output but never JSON, warnings or errors.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde_json::json;

use crate::domain::lifecycle::LifecycleStatus;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Verbosity level (0 = normal, 1+ = increasingly verbose).
    pub verbose: u8,
    /// Apply ANSI colors to human output.
    pub color: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8, color: bool) -> Self {
        Self {
            json,
            quiet,
            verbose,
            color,
        }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn current() -> OutputConfig {
    *cell().read()
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    *cell().write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    current().json
}

#[must_use]
pub fn is_quiet() -> bool {
    current().quiet
}

#[must_use]
pub fn verbosity() -> u8 {
    current().verbose
}

/// Route one message to JSON or text.
fn emit(kind: &str, payload: serde_json::Value, text: impl FnOnce()) {
    let config = current();
    if config.json {
        println!("{}", json!({ "type": kind, "payload": payload }));
    } else if !config.quiet {
        text();
    }
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    emit("header", json!({ "app": "stratagem", "version": version }), || {
        println!("{} {}", paint("stratagem", |v| v.bold().to_string()), muted(version));
    });
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit("field", json!({ "label": label, "value": value }), || {
        println!("  {} {}", muted(format!("{label:<14}")), value);
    });
}

pub fn section(title: &str) {
    emit("section", json!({ "title": title }), || {
        println!();
        println!("{}", paint(title, |v| v.bold().to_string()));
    });
}

pub fn success(message: &str) {
    emit("success", json!({ "message": message }), || {
        println!("  {} {}", paint("✓", |v| v.green().to_string()), message);
    });
}

/// Print a warning line. Shown even in quiet mode.
pub fn warning(message: &str) {
    if is_json() {
        println!("{}", json!({ "type": "warning", "payload": { "message": message } }));
    } else {
        println!("  {} {}", paint("⚠", |v| v.yellow().to_string()), message);
    }
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
    } else {
        eprintln!("  {} {}", paint("×", |v| v.red().to_string()), message);
    }
}

pub fn hint(message: &str) {
    emit("hint", json!({ "message": message }), || {
        println!("  {}: {}", highlight("hint"), muted(message));
    });
}

/// Print multi-line content (usually a rendered table), indented.
pub fn lines(content: &str) {
    emit("lines", json!({ "content": content }), || {
        for line in content.lines() {
            println!("  {line}");
        }
    });
}

/// Emit a JSON document directly.
pub fn json_output(value: &serde_json::Value) {
    println!("{value}");
}

/// Format a highlighted value in cyan.
#[must_use]
pub fn highlight(value: impl Display) -> String {
    paint(value, |v| v.cyan().to_string())
}

/// Format a dimmed/muted value.
#[must_use]
pub fn muted(value: impl Display) -> String {
    paint(value, |v| v.dimmed().to_string())
}

/// Color a lifecycle status by severity.
#[must_use]
pub fn status(status: LifecycleStatus) -> String {
    paint(status, |v| match status {
        LifecycleStatus::Active => v.green().to_string(),
        LifecycleStatus::Probation => v.yellow().to_string(),
        LifecycleStatus::CircuitBreakerOpen => v.magenta().to_string(),
        LifecycleStatus::Quarantine => v.red().to_string(),
        LifecycleStatus::Deprecated => v.dimmed().to_string(),
    })
}

fn paint(value: impl Display, style: impl FnOnce(&str) -> String) -> String {
    let value = value.to_string();
    let config = current();
    if config.json || !config.color {
        return value;
    }
    style(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_leaves_plain_text_without_color() {
        configure(OutputConfig::new(true, false, 0, true));
        assert_eq!(status(LifecycleStatus::Active), LifecycleStatus::Active.to_string());
        assert_eq!(muted("x"), "x");
        configure(OutputConfig::new(false, false, 0, false));
        assert_eq!(highlight("v42"), "v42");
        configure(OutputConfig::default());
    }
}
