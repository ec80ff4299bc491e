//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier newtype.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Strategy identifier, stable across restarts.
    StrategyId
);

string_id!(
    /// Target entity a signal refers to (a fixture, event or instrument).
    EntityId
);

string_id!(
    /// Bet/market type on an entity, e.g. `moneyline` or `total`.
    ///
    /// Signals for different markets of the same entity never conflict.
    Market
);

string_id!(
    /// Side or outcome a strategy recommends, e.g. `home` or `over`.
    Recommendation
);

/// Alert identifier - UUID based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl AlertId {
    /// Generate a new random alert ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the alert ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AlertId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_id_displays_inner_value() {
        let id = StrategyId::new("sharp-steam");
        assert_eq!(id.to_string(), "sharp-steam");
        assert_eq!(id.as_str(), "sharp-steam");
    }

    #[test]
    fn ids_serialize_transparently() {
        let market = Market::from("moneyline");
        let json = serde_json::to_string(&market).unwrap();
        assert_eq!(json, "\"moneyline\"");
    }

    #[test]
    fn generated_alert_ids_are_unique() {
        assert_ne!(AlertId::generate(), AlertId::generate());
    }
}
