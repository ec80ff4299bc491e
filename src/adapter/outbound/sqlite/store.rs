//! SQLite configuration store implementation.
//!
//! Persists configuration snapshots, the audit trail and the strategy
//! registry using SQLite and Diesel ORM. A snapshot batch is written in one
//! transaction.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    format_timestamp, AlertRow, ConfigurationRow, KillSwitchRow, LifecycleEventRow,
    NewConfigurationRow, NewKillSwitchRow, NewLifecycleEventRow, NewUpdateTriggerRow, StrategyRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    alerts, configuration_history, kill_switch_events, lifecycle_events, strategies,
    update_triggers,
};
use crate::domain::alert::{Alert, KillSwitchAudit};
use crate::domain::configuration::ConfigurationVersion;
use crate::domain::id::AlertId;
use crate::domain::lifecycle::LifecycleEvent;
use crate::domain::strategy::StrategyEntry;
use crate::error::{Error, Result};
use crate::port::outbound::store::{ConfigurationStore, HistoryEntry, HistoryQuery, SnapshotBatch};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed configuration store.
///
/// Implements the [`ConfigurationStore`] trait.
pub struct SqliteConfigurationStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteConfigurationStore {
    /// Create a new SQLite configuration store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }
}

#[async_trait]
impl ConfigurationStore for SqliteConfigurationStore {
    async fn persist_snapshot(&self, batch: &SnapshotBatch) -> Result<()> {
        let configurations: Vec<NewConfigurationRow> = batch
            .configurations
            .iter()
            .map(|c| NewConfigurationRow::new(c, batch.trigger.kind))
            .collect();
        let events = batch
            .events
            .iter()
            .map(NewLifecycleEventRow::new)
            .collect::<Result<Vec<_>>>()?;
        let now = Utc::now();
        let registry: Vec<StrategyRow> = batch
            .strategies
            .iter()
            .map(|entry| StrategyRow::from_entry(entry, now))
            .collect();
        let trigger = NewUpdateTriggerRow::from(&batch.trigger);

        let mut conn = self.conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(update_triggers::table)
                .values(&trigger)
                .execute(conn)?;
            if !configurations.is_empty() {
                diesel::insert_into(configuration_history::table)
                    .values(&configurations)
                    .execute(conn)?;
            }
            if !events.is_empty() {
                diesel::insert_into(lifecycle_events::table)
                    .values(&events)
                    .execute(conn)?;
            }
            if !registry.is_empty() {
                diesel::replace_into(strategies::table)
                    .values(&registry)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn append_event(&self, event: &LifecycleEvent) -> Result<()> {
        let row = NewLifecycleEventRow::new(event)?;
        let mut conn = self.conn()?;

        diesel::insert_into(lifecycle_events::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn upsert_strategy(&self, entry: &StrategyEntry) -> Result<()> {
        let row = StrategyRow::from_entry(entry, Utc::now());
        let mut conn = self.conn()?;

        diesel::replace_into(strategies::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn load_strategies(&self) -> Result<Vec<StrategyEntry>> {
        let mut conn = self.conn()?;

        let rows: Vec<StrategyRow> = strategies::table
            .order(strategies::id.asc())
            .select(StrategyRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(StrategyRow::into_entry).collect()
    }

    async fn latest_version(&self) -> Result<Option<ConfigurationVersion>> {
        let mut conn = self.conn()?;

        let from_triggers: Option<i64> = update_triggers::table
            .select(diesel::dsl::max(update_triggers::new_version))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let from_history: Option<i64> = configuration_history::table
            .select(diesel::dsl::max(configuration_history::version))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(from_triggers
            .max(from_history)
            .map(|v| ConfigurationVersion::new(u64::try_from(v).unwrap_or(0))))
    }

    async fn configuration_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let mut conn = self.conn()?;
        let since = format_timestamp(query.since);

        let mut select = configuration_history::table
            .filter(configuration_history::created_at.ge(since))
            .into_boxed();
        if let Some(id) = &query.strategy_id {
            select = select.filter(configuration_history::strategy_id.eq(id.to_string()));
        }
        let rows: Vec<ConfigurationRow> = select
            .order((
                configuration_history::version.desc(),
                configuration_history::strategy_id.asc(),
            ))
            .select(ConfigurationRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let trigger = row.trigger()?;
                Ok(HistoryEntry {
                    configuration: row.into_configuration()?,
                    trigger,
                })
            })
            .collect()
    }

    async fn lifecycle_events(&self, query: &HistoryQuery) -> Result<Vec<LifecycleEvent>> {
        let mut conn = self.conn()?;
        let since = format_timestamp(query.since);

        let mut select = lifecycle_events::table
            .filter(lifecycle_events::created_at.ge(since))
            .into_boxed();
        if let Some(id) = &query.strategy_id {
            select = select.filter(lifecycle_events::strategy_id.eq(id.to_string()));
        }
        let rows: Vec<LifecycleEventRow> = select
            .order(lifecycle_events::id.asc())
            .select(LifecycleEventRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(LifecycleEventRow::into_event).collect()
    }

    async fn raise_alert(&self, alert: &Alert) -> Result<()> {
        let row = AlertRow::from(alert);
        let mut conn = self.conn()?;

        diesel::insert_into(alerts::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn alerts(&self, unacknowledged_only: bool) -> Result<Vec<Alert>> {
        let mut conn = self.conn()?;

        let rows: Vec<AlertRow> = if unacknowledged_only {
            alerts::table
                .filter(alerts::acknowledged.eq(0))
                .order(alerts::raised_at.desc())
                .select(AlertRow::as_select())
                .load(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?
        } else {
            alerts::table
                .order(alerts::raised_at.desc())
                .select(AlertRow::as_select())
                .load(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?
        };

        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    async fn acknowledge_alert(&self, id: &AlertId) -> Result<bool> {
        let mut conn = self.conn()?;

        let updated = diesel::update(alerts::table.find(id.as_str().to_string()))
            .set(alerts::acknowledged.eq(1))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(updated > 0)
    }

    async fn record_kill_switch(&self, audit: &KillSwitchAudit) -> Result<()> {
        let row = NewKillSwitchRow::from(audit);
        let mut conn = self.conn()?;

        diesel::insert_into(kill_switch_events::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn latest_kill_switch(&self) -> Result<Option<KillSwitchAudit>> {
        let mut conn = self.conn()?;

        let row: Option<KillSwitchRow> = kill_switch_events::table
            .order(kill_switch_events::id.desc())
            .select(KillSwitchRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(KillSwitchRow::into_audit).transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::alert::{AlertLevel, KillSwitchAction};
    use crate::domain::category::StrategyCategory;
    use crate::domain::configuration::{Activation, StrategyConfiguration, Tuning};
    use crate::domain::id::StrategyId;
    use crate::domain::lifecycle::{LifecycleStatus, TransitionReason};
    use crate::domain::trigger::{TriggerKind, TriggerRecord};

    fn store() -> (tempfile::TempDir, SqliteConfigurationStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.db");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        (dir, SqliteConfigurationStore::new(pool))
    }

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap()
    }

    fn batch(version: u64) -> SnapshotBatch {
        let id = StrategyId::new("steam");
        let version = ConfigurationVersion::new(version);
        let entry = StrategyEntry::new(id.clone(), StrategyCategory::LineMovement, t0(), 7);
        SnapshotBatch {
            version,
            trigger: TriggerRecord {
                kind: TriggerKind::Scheduled,
                fired_at: t0(),
                prior_version: ConfigurationVersion::new(version.value() - 1),
                new_version: version,
                strategies_affected: 1,
                duration_ms: 4,
            },
            configurations: vec![StrategyConfiguration {
                strategy_id: id.clone(),
                status: LifecycleStatus::Active,
                activation: Activation::Enabled(Tuning {
                    confidence_multiplier: 1.1,
                    threshold_adjustment: 0.0,
                    ensemble_weight: 0.7,
                    max_emissions_per_period: 6,
                }),
                derived_at: t0(),
                version,
            }],
            events: vec![LifecycleEvent {
                strategy_id: id,
                previous_status: Some(LifecycleStatus::Probation),
                new_status: LifecycleStatus::Active,
                reason: TransitionReason::Graduated,
                performance: None,
                timestamp: t0(),
            }],
            strategies: vec![entry],
        }
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_history() {
        let (_dir, store) = store();
        store.persist_snapshot(&batch(1)).await.unwrap();
        store.persist_snapshot(&batch(2)).await.unwrap();

        let query = HistoryQuery {
            strategy_id: Some(StrategyId::new("steam")),
            since: t0() - Duration::days(1),
        };
        let history = store.configuration_history(&query).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].configuration.version, ConfigurationVersion::new(2));
        assert_eq!(history[0].trigger, TriggerKind::Scheduled);
        assert_eq!(history[0].configuration.ensemble_weight(), 0.7);

        assert_eq!(
            store.latest_version().await.unwrap(),
            Some(ConfigurationVersion::new(2))
        );
        let events = store.lifecycle_events(&query).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].reason, TransitionReason::Graduated);
        assert_eq!(store.load_strategies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_version_rolls_back_whole_batch() {
        let (_dir, store) = store();
        store.persist_snapshot(&batch(1)).await.unwrap();
        assert!(store.persist_snapshot(&batch(1)).await.is_err());

        let query = HistoryQuery {
            strategy_id: None,
            since: t0() - Duration::days(1),
        };
        assert_eq!(store.lifecycle_events(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn alerts_can_be_acknowledged() {
        let (_dir, store) = store();
        let alert = Alert::new(None, AlertLevel::Critical, "persist failed", t0());
        store.raise_alert(&alert).await.unwrap();

        assert_eq!(store.alerts(true).await.unwrap().len(), 1);
        assert!(store.acknowledge_alert(&alert.id).await.unwrap());
        assert!(store.alerts(true).await.unwrap().is_empty());
        assert_eq!(store.alerts(false).await.unwrap().len(), 1);
        assert!(!store
            .acknowledge_alert(&AlertId::from("missing".to_string()))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn latest_kill_switch_wins() {
        let (_dir, store) = store();
        assert!(store.latest_kill_switch().await.unwrap().is_none());
        let actions = [
            (KillSwitchAction::Activated, 0),
            (KillSwitchAction::Deactivated, 5),
        ];
        for (action, minutes) in actions {
            store
                .record_kill_switch(&KillSwitchAudit {
                    action,
                    actor: "ops".into(),
                    reason: None,
                    at: t0() + Duration::minutes(minutes),
                })
                .await
                .unwrap();
        }
        let latest = store.latest_kill_switch().await.unwrap().unwrap();
        assert_eq!(latest.action, KillSwitchAction::Deactivated);
    }
}
