//! Command-line interface definitions.
//!
//! Defines the CLI structure for the stratagem engine using `clap`: running
//! the background loop, inspecting the live configuration and its history,
//! and the audited operator controls.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::category::StrategyCategory;

use super::paths;

/// Adaptive strategy lifecycle and ensemble engine
#[derive(Parser, Debug)]
#[command(name = "stratagem")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine loop in the foreground (Ctrl-C to stop)
    Run(RunArgs),

    /// Refresh once and print the live configuration
    Status,

    /// Show published configurations for recent days
    History(HistoryArgs),

    /// Check whether a strategy may act right now
    Gate(StrategyArg),

    /// Toggle the process-wide kill switch
    #[command(subcommand, name = "kill-switch")]
    KillSwitch(KillSwitchCommand),

    /// Register a strategy (idempotent)
    Register(RegisterArgs),

    /// Promote a strategy to ACTIVE
    Promote(PromoteArgs),

    /// Retire a strategy
    Deprecate(DeprecateArgs),

    /// List or acknowledge operator alerts
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Validate the configuration file
    Check,
}

/// Arguments for `stratagem run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run a single poll and execution cycle, then exit
    #[arg(long)]
    pub once: bool,
}

/// Arguments for `stratagem history`.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Only show this strategy
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// How many days back to look
    #[arg(short, long, default_value_t = 7)]
    pub days: u32,
}

/// A single strategy id.
#[derive(Parser, Debug)]
pub struct StrategyArg {
    /// Strategy id
    pub id: String,
}

/// Subcommands for `stratagem kill-switch`.
#[derive(Subcommand, Debug)]
pub enum KillSwitchCommand {
    /// Block every gate check
    On {
        /// Operator name recorded in the audit trail
        #[arg(long)]
        by: String,
        /// Why the switch was thrown
        #[arg(long, default_value = "manual")]
        reason: String,
    },
    /// Resume gate checks
    Off {
        /// Operator name recorded in the audit trail
        #[arg(long)]
        by: String,
    },
}

/// Arguments for `stratagem register`.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Strategy id
    pub id: String,

    /// Strategy category, fixed at registration
    #[arg(long, default_value = "uncategorized")]
    pub category: StrategyCategory,
}

/// Arguments for `stratagem promote`.
#[derive(Parser, Debug)]
pub struct PromoteArgs {
    /// Strategy id
    pub id: String,

    /// Operator name recorded in the audit trail
    #[arg(long)]
    pub by: String,
}

/// Arguments for `stratagem deprecate`.
#[derive(Parser, Debug)]
pub struct DeprecateArgs {
    /// Strategy id
    pub id: String,

    /// Operator name recorded in the audit trail
    #[arg(long)]
    pub by: String,

    #[arg(long, default_value = "retired")]
    pub reason: String,
}

/// Subcommands for `stratagem alerts`.
#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// List alerts (unacknowledged by default)
    List {
        /// Include acknowledged alerts
        #[arg(long)]
        all: bool,
    },
    /// Acknowledge an alert by id
    Ack {
        /// Alert id
        id: String,
    },
}
