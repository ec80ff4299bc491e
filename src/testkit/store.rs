//! In-memory configuration store with write-failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::alert::{Alert, KillSwitchAudit};
use crate::domain::configuration::ConfigurationVersion;
use crate::domain::id::{AlertId, StrategyId};
use crate::domain::lifecycle::LifecycleEvent;
use crate::domain::strategy::StrategyEntry;
use crate::error::{Error, Result};
use crate::port::outbound::store::{ConfigurationStore, HistoryEntry, HistoryQuery, SnapshotBatch};

#[derive(Debug, Default)]
struct Tables {
    batches: Vec<SnapshotBatch>,
    events: Vec<LifecycleEvent>,
    strategies: BTreeMap<StrategyId, StrategyEntry>,
    alerts: Vec<Alert>,
    kill_switch: Vec<KillSwitchAudit>,
}

/// Mirrors the SQLite store's semantics: batches are all-or-nothing and a
/// version can be written only once.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationStore {
    tables: Mutex<Tables>,
    /// Remaining writes to fail before succeeding again.
    fail_next: AtomicU32,
    fail_always: AtomicBool,
    write_attempts: AtomicU32,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` writes of any kind.
    pub fn fail_next_writes(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Fail every write until turned off.
    pub fn set_failing(&self, failing: bool) {
        self.fail_always.store(failing, Ordering::SeqCst);
    }

    /// Write calls so far, failed or not.
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Versions persisted, in write order.
    pub fn persisted_versions(&self) -> Vec<ConfigurationVersion> {
        self.tables.lock().batches.iter().map(|b| b.version).collect()
    }

    pub fn batches(&self) -> Vec<SnapshotBatch> {
        self.tables.lock().batches.clone()
    }

    /// Every lifecycle event, from batches and direct appends, in write order.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.tables.lock().events.clone()
    }

    pub fn kill_switch_log(&self) -> Vec<KillSwitchAudit> {
        self.tables.lock().kill_switch.clone()
    }

    /// Seed a registry row without going through the engine.
    pub fn seed_strategy(&self, entry: StrategyEntry) {
        self.tables.lock().strategies.insert(entry.id.clone(), entry);
    }

    fn write(&self) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_always.load(Ordering::SeqCst) {
            return Err(Error::Database("injected write failure".into()));
        }
        let failed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::Database("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn persist_snapshot(&self, batch: &SnapshotBatch) -> Result<()> {
        self.write()?;
        let mut tables = self.tables.lock();
        if tables.batches.iter().any(|b| b.version == batch.version) {
            return Err(Error::Database(format!(
                "UNIQUE constraint failed: version {}",
                batch.version
            )));
        }
        tables.batches.push(batch.clone());
        tables.events.extend(batch.events.iter().cloned());
        for entry in &batch.strategies {
            tables.strategies.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }

    async fn append_event(&self, event: &LifecycleEvent) -> Result<()> {
        self.write()?;
        self.tables.lock().events.push(event.clone());
        Ok(())
    }

    async fn upsert_strategy(&self, entry: &StrategyEntry) -> Result<()> {
        self.write()?;
        self.tables
            .lock()
            .strategies
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn load_strategies(&self) -> Result<Vec<StrategyEntry>> {
        Ok(self.tables.lock().strategies.values().cloned().collect())
    }

    async fn latest_version(&self) -> Result<Option<ConfigurationVersion>> {
        Ok(self.tables.lock().batches.iter().map(|b| b.version).max())
    }

    async fn configuration_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let tables = self.tables.lock();
        let mut entries: Vec<HistoryEntry> = tables
            .batches
            .iter()
            .flat_map(|batch| {
                batch.configurations.iter().map(move |c| HistoryEntry {
                    configuration: c.clone(),
                    trigger: batch.trigger.kind,
                })
            })
            .filter(|e| e.configuration.derived_at >= query.since)
            .filter(|e| {
                query
                    .strategy_id
                    .as_ref()
                    .map_or(true, |id| &e.configuration.strategy_id == id)
            })
            .collect();
        entries.sort_by(|a, b| {
            b.configuration
                .version
                .cmp(&a.configuration.version)
                .then_with(|| a.configuration.strategy_id.cmp(&b.configuration.strategy_id))
        });
        Ok(entries)
    }

    async fn lifecycle_events(&self, query: &HistoryQuery) -> Result<Vec<LifecycleEvent>> {
        Ok(self
            .tables
            .lock()
            .events
            .iter()
            .filter(|e| e.timestamp >= query.since)
            .filter(|e| {
                query
                    .strategy_id
                    .as_ref()
                    .map_or(true, |id| &e.strategy_id == id)
            })
            .cloned()
            .collect())
    }

    async fn raise_alert(&self, alert: &Alert) -> Result<()> {
        self.write()?;
        self.tables.lock().alerts.push(alert.clone());
        Ok(())
    }

    async fn alerts(&self, unacknowledged_only: bool) -> Result<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .tables
            .lock()
            .alerts
            .iter()
            .filter(|a| !unacknowledged_only || !a.acknowledged)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
        Ok(alerts)
    }

    async fn acknowledge_alert(&self, id: &AlertId) -> Result<bool> {
        self.write()?;
        let mut tables = self.tables.lock();
        match tables.alerts.iter_mut().find(|a| &a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_kill_switch(&self, audit: &KillSwitchAudit) -> Result<()> {
        self.write()?;
        self.tables.lock().kill_switch.push(audit.clone());
        Ok(())
    }

    async fn latest_kill_switch(&self) -> Result<Option<KillSwitchAudit>> {
        Ok(self.tables.lock().kill_switch.last().cloned())
    }
}
