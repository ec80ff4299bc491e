//! Declared strategies.

use serde::Deserialize;

use crate::domain::category::StrategyCategory;
use crate::domain::id::StrategyId;

/// One `[[strategies]]` entry.
///
/// The category is fixed here at registration and never derived from the id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StrategyDecl {
    pub id: String,
    #[serde(default)]
    pub category: StrategyCategory,
}

impl StrategyDecl {
    #[must_use]
    pub fn to_pair(&self) -> (StrategyId, StrategyCategory) {
        (StrategyId::new(self.id.clone()), self.category)
    }
}
