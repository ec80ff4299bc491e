//! Update trigger kinds and their audit records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::configuration::ConfigurationVersion;

/// Reason a configuration refresh ran.
///
/// Variants are listed in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    ManualOverride,
    PerformanceDegradation,
    NewData,
    Scheduled,
    /// Initial refresh at process start.
    Startup,
}

impl TriggerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManualOverride => "MANUAL_OVERRIDE",
            Self::PerformanceDegradation => "PERFORMANCE_DEGRADATION",
            Self::NewData => "NEW_DATA",
            Self::Scheduled => "SCHEDULED",
            Self::Startup => "STARTUP",
        }
    }

    /// Parse a stored trigger type.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        [
            Self::ManualOverride,
            Self::PerformanceDegradation,
            Self::NewData,
            Self::Scheduled,
            Self::Startup,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == raw)
    }

    /// Return `true` if this trigger ignores the debounce window.
    #[must_use]
    pub const fn bypasses_debounce(self) -> bool {
        matches!(self, Self::ManualOverride | Self::Startup)
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub kind: TriggerKind,
    pub fired_at: DateTime<Utc>,
    pub prior_version: ConfigurationVersion,
    pub new_version: ConfigurationVersion,
    pub strategies_affected: u32,
    pub duration_ms: u64,
}
