//! Strategy categories, fixed at registration time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Family a strategy belongs to.
///
/// Supplied explicitly when a strategy is registered and stored with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    LineMovement,
    SharpMoney,
    PublicFade,
    Statistical,
    Situational,
    #[default]
    Uncategorized,
}

impl StrategyCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LineMovement => "line_movement",
            Self::SharpMoney => "sharp_money",
            Self::PublicFade => "public_fade",
            Self::Statistical => "statistical",
            Self::Situational => "situational",
            Self::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for StrategyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "line_movement" => Ok(Self::LineMovement),
            "sharp_money" => Ok(Self::SharpMoney),
            "public_fade" => Ok(Self::PublicFade),
            "statistical" => Ok(Self::Statistical),
            "situational" => Ok(Self::Situational),
            "uncategorized" => Ok(Self::Uncategorized),
            other => Err(format!("unknown strategy category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_and_snake_case() {
        assert_eq!(
            "sharp-money".parse::<StrategyCategory>(),
            Ok(StrategyCategory::SharpMoney)
        );
        assert_eq!(
            "line_movement".parse::<StrategyCategory>(),
            Ok(StrategyCategory::LineMovement)
        );
    }

    #[test]
    fn names_are_not_inferred() {
        // A strategy called "sharp_fade_v2" is still only what it was registered as.
        assert!("sharp_fade_v2".parse::<StrategyCategory>().is_err());
    }
}
