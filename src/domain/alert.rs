//! Operator alerts and kill-switch audit entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AlertId, StrategyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parse a stored level, falling back to `Warning` for unknown values.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "INFO" => Self::Info,
            "CRITICAL" => Self::Critical,
            _ => Self::Warning,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub strategy_id: Option<StrategyId>,
    pub level: AlertLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    pub acknowledged: bool,
}

impl Alert {
    /// Create a new, unacknowledged alert.
    #[must_use]
    pub fn new(
        strategy_id: Option<StrategyId>,
        level: AlertLevel,
        message: impl Into<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::generate(),
            strategy_id,
            level,
            message: message.into(),
            raised_at,
            acknowledged: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillSwitchAction {
    Activated,
    Deactivated,
}

impl KillSwitchAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
        }
    }
}

/// Audit entry for a process-wide kill-switch change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillSwitchAudit {
    pub action: KillSwitchAction,
    pub actor: String,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}
