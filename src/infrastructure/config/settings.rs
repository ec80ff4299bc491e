//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all engine settings.
//! Every section is optional; missing fields take their defaults.
//!
//! # Example
//!
//! ```no_run
//! use stratagem::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::engine::{BootstrapConfig, ExecutionConfig, PersistenceConfig, TriggerConfig};
use super::lifecycle::{BuilderConfig, LifecycleConfig};
use super::logging::LoggingConfig;
use super::strategy::StrategyDecl;
use crate::application::engine::EngineConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Lifecycle transition thresholds.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Tuning formula bounds.
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Refresh trigger timings.
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Cold-start fallback set.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Write retry policy.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Strategies registered at startup.
    #[serde(default)]
    pub strategies: Vec<StrategyDecl>,

    /// Path to SQLite database file.
    ///
    /// Defaults to "stratagem.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            lifecycle: LifecycleConfig::default(),
            builder: BuilderConfig::default(),
            trigger: TriggerConfig::default(),
            bootstrap: BootstrapConfig::default(),
            execution: ExecutionConfig::default(),
            persistence: PersistenceConfig::default(),
            strategies: Vec::new(),
            database: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "stratagem.db".to_string()
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

fn check_fraction(field: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, "must be between 0 and 1"));
    }
    Ok(())
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }

        let lifecycle = &self.lifecycle;
        if lifecycle.min_samples == 0 {
            return Err(invalid("min_samples", "must be greater than 0"));
        }
        check_fraction("probation_win_rate", lifecycle.probation_win_rate)?;
        if lifecycle.hard_roi_floor > lifecycle.probation_roi {
            return Err(invalid("hard_roi_floor", "must be <= probation_roi"));
        }
        if lifecycle.consecutive_loss_threshold == 0 {
            return Err(invalid("consecutive_loss_threshold", "must be greater than 0"));
        }
        if lifecycle.grace_days < 0 {
            return Err(invalid("grace_days", "must be 0 or greater"));
        }
        if lifecycle.evaluation_window_hours == 0 {
            return Err(invalid("evaluation_window_hours", "must be greater than 0"));
        }

        let builder = &self.builder;
        if builder.multiplier_floor <= 0.0 || builder.multiplier_floor > builder.multiplier_ceiling
        {
            return Err(invalid(
                "multiplier_floor",
                "must be greater than 0 and <= multiplier_ceiling",
            ));
        }
        if builder.decay_rate < 0.0 {
            return Err(invalid("decay_rate", "must be 0 or greater"));
        }
        check_fraction("threshold_win_rate", builder.threshold_win_rate)?;
        check_fraction("max_threshold_adjustment", builder.max_threshold_adjustment)?;
        check_fraction("min_weight", builder.min_weight)?;

        let trigger = &self.trigger;
        if trigger.scheduled_interval_mins == 0 {
            return Err(invalid("scheduled_interval_mins", "must be greater than 0"));
        }
        if trigger.staleness_ceiling_hours.saturating_mul(60) < trigger.scheduled_interval_mins {
            return Err(invalid(
                "staleness_ceiling_hours",
                "must be >= scheduled_interval_mins",
            ));
        }
        if trigger.degradation_points <= 0.0 {
            return Err(invalid("degradation_points", "must be greater than 0"));
        }
        if trigger.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be greater than 0"));
        }
        if trigger.lookback_days == 0 {
            return Err(invalid("lookback_days", "must be greater than 0"));
        }

        let bootstrap = &self.bootstrap;
        check_fraction("bootstrap.ensemble_weight", bootstrap.ensemble_weight)?;
        if bootstrap.confidence_multiplier <= 0.0 {
            return Err(invalid(
                "bootstrap.confidence_multiplier",
                "must be greater than 0",
            ));
        }
        if bootstrap.max_emissions_per_period == 0 {
            return Err(invalid(
                "bootstrap.max_emissions_per_period",
                "must be greater than 0",
            ));
        }
        if bootstrap.grace_days < 0 {
            return Err(invalid("bootstrap.grace_days", "must be 0 or greater"));
        }

        let execution = &self.execution;
        if execution.strategy_timeout_ms == 0 {
            return Err(invalid("strategy_timeout_ms", "must be greater than 0"));
        }
        if execution.cycle_timeout_ms < execution.strategy_timeout_ms {
            return Err(invalid("cycle_timeout_ms", "must be >= strategy_timeout_ms"));
        }
        check_fraction("min_signal_confidence", execution.min_signal_confidence)?;

        let persistence = &self.persistence;
        if persistence.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be greater than 0"));
        }
        if persistence.initial_delay_ms == 0 {
            return Err(invalid("initial_delay_ms", "must be greater than 0"));
        }
        if persistence.max_delay_ms < persistence.initial_delay_ms {
            return Err(invalid("max_delay_ms", "must be >= initial_delay_ms"));
        }
        if persistence.backoff_multiplier < 1.0 {
            return Err(invalid("backoff_multiplier", "must be >= 1.0"));
        }

        // A category is fixed at registration, so one id cannot carry two.
        let mut seen = std::collections::HashMap::new();
        for decl in self.strategies.iter().chain(&self.bootstrap.fallback) {
            if decl.id.trim().is_empty() {
                return Err(invalid("strategies.id", "must not be empty"));
            }
            if let Some(previous) = seen.insert(decl.id.as_str(), decl.category) {
                if previous != decl.category {
                    return Err(ConfigError::InvalidValue {
                        field: "strategies.category",
                        reason: format!("conflicting categories declared for {}", decl.id),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Build the engine configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            thresholds: (&self.lifecycle).into(),
            builder: (&self.builder).into(),
            bootstrap: (&self.bootstrap).into(),
            trigger: (&self.trigger).into(),
            execution: (&self.execution).into(),
            retry: (&self.persistence).into(),
            lookback: chrono::Duration::days(i64::from(self.trigger.lookback_days)),
            poll_interval: Duration::from_secs(self.trigger.poll_interval_secs),
            strategies: self.strategies.iter().map(StrategyDecl::to_pair).collect(),
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
