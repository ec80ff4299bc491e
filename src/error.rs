use thiserror::Error;

use crate::domain::configuration::ConfigurationVersion;
use crate::domain::id::StrategyId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised by the lifecycle engine and its collaborators.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("performance data unavailable: {0}")]
    DataUnavailable(String),

    #[error("malformed performance record for {strategy_id}: {reason}")]
    MalformedRecord {
        strategy_id: StrategyId,
        reason: String,
    },

    #[error("strategy {strategy_id} failed to execute: {reason}")]
    ExecutionFailure {
        strategy_id: StrategyId,
        reason: String,
    },

    #[error("persistence failed after {attempts} attempt(s): {reason}")]
    PersistenceFailure { attempts: u32, reason: String },

    #[error("version regression: proposed {proposed} is not greater than current {current}")]
    InvariantViolation {
        current: ConfigurationVersion,
        proposed: ConfigurationVersion,
    },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(StrategyId),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}
