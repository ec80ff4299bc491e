//! In-memory strategy registry.
//!
//! Mirrors the store's `strategies` table. Refresh cycles work on a copy
//! from [`StrategyRegistry::entries`] and write it back with
//! [`StrategyRegistry::commit`] only after the batch is persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::category::StrategyCategory;
use crate::domain::id::StrategyId;
use crate::domain::lifecycle::LifecycleStatus;
use crate::domain::strategy::StrategyEntry;

#[derive(Debug, Default)]
pub struct StrategyRegistry {
    entries: RwLock<BTreeMap<StrategyId, StrategyEntry>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &StrategyId) -> bool {
        self.entries.read().contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &StrategyId) -> Option<StrategyEntry> {
        self.entries.read().get(id).cloned()
    }

    #[must_use]
    pub fn status(&self, id: &StrategyId) -> Option<LifecycleStatus> {
        self.entries.read().get(id).map(|e| e.status)
    }

    /// All entries in id order.
    #[must_use]
    pub fn entries(&self) -> Vec<StrategyEntry> {
        self.entries.read().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Register a strategy if unknown. Returns the new entry, or `None` if
    /// the id was already registered.
    pub fn register(
        &self,
        id: &StrategyId,
        category: StrategyCategory,
        first_seen: DateTime<Utc>,
        grace_days: i64,
    ) -> Option<StrategyEntry> {
        let mut entries = self.entries.write();
        if entries.contains_key(id) {
            return None;
        }
        let entry = StrategyEntry::new(id.clone(), category, first_seen, grace_days);
        entries.insert(id.clone(), entry.clone());
        Some(entry)
    }

    /// Insert or replace one entry.
    pub fn upsert(&self, entry: StrategyEntry) {
        self.entries.write().insert(entry.id.clone(), entry);
    }

    /// Forget `id`. Used to undo a registration that was never persisted.
    pub fn unregister(&self, id: &StrategyId) -> Option<StrategyEntry> {
        self.entries.write().remove(id)
    }

    /// Write back entries evaluated by a refresh cycle.
    ///
    /// Lifetime emission counts keep whichever value is higher, since gate
    /// checks keep counting while a cycle runs.
    pub fn commit(&self, updated: impl IntoIterator<Item = StrategyEntry>) {
        let mut entries = self.entries.write();
        for mut entry in updated {
            if let Some(existing) = entries.get(&entry.id) {
                entry.counters.approved_emissions = entry
                    .counters
                    .approved_emissions
                    .max(existing.counters.approved_emissions);
            }
            entries.insert(entry.id.clone(), entry);
        }
    }

    /// Count one approved gate check.
    pub fn record_emission(&self, id: &StrategyId) {
        if let Some(entry) = self.entries.write().get_mut(id) {
            entry.counters.approved_emissions += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let registry = StrategyRegistry::new();
        let id = StrategyId::new("steam");
        let now = Utc::now();
        assert!(registry
            .register(&id, StrategyCategory::LineMovement, now, 7)
            .is_some());
        assert!(registry
            .register(&id, StrategyCategory::PublicFade, now, 7)
            .is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&id).map(|e| e.category),
            Some(StrategyCategory::LineMovement)
        );
    }

    #[test]
    fn commit_keeps_emissions_counted_during_cycle() {
        let registry = StrategyRegistry::new();
        let id = StrategyId::new("steam");
        registry.register(&id, StrategyCategory::LineMovement, Utc::now(), 7);
        let mut working = registry.entries();

        registry.record_emission(&id);
        registry.record_emission(&id);

        working[0].status = LifecycleStatus::Active;
        registry.commit(working);

        let entry = registry.get(&id).map(|e| (e.status, e.counters.approved_emissions));
        assert_eq!(entry, Some((LifecycleStatus::Active, 2)));
    }
}
