//! SQLite performance source.
//!
//! Reads the `performance_records` table written by the measurement
//! subsystem.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    format_timestamp, parse_timestamp, NewPerformanceRow, PerformanceRow,
};
use crate::adapter::outbound::sqlite::database::schema::performance_records;
use crate::domain::performance::PerformanceRecord;
use crate::error::{Error, Result};
use crate::port::outbound::performance::PerformanceSource;

pub struct SqlitePerformanceSource {
    pool: DbPool,
}

impl SqlitePerformanceSource {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append records. Used by ingestion tooling and tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert(&self, records: &[PerformanceRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewPerformanceRow> = records.iter().map(NewPerformanceRow::from).collect();
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::insert_into(performance_records::table)
            .values(&rows)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[async_trait]
impl PerformanceSource for SqlitePerformanceSource {
    async fn read_performance(&self, lookback: chrono::Duration) -> Result<Vec<PerformanceRecord>> {
        let since = format_timestamp(Utc::now() - lookback);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<PerformanceRow> = performance_records::table
            .filter(performance_records::observed_at.ge(since))
            .order(performance_records::observed_at.asc())
            .select(PerformanceRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        // Rows with unreadable timestamps are dropped here; numeric validation
        // happens in the engine.
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                row.into_record()
                    .map_err(|e| warn!(row = ?id, error = %e, "Unreadable performance row"))
                    .ok()
            })
            .collect())
    }

    async fn latest_observation(&self) -> Result<Option<DateTime<Utc>>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let latest: Option<String> = performance_records::table
            .select(diesel::dsl::max(performance_records::observed_at))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        latest.as_deref().map(parse_timestamp).transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::id::StrategyId;

    fn record(id: &str, age: Duration) -> PerformanceRecord {
        PerformanceRecord {
            strategy_id: StrategyId::new(id),
            win_rate: 0.58,
            roi: 9.5,
            sample_size: 44,
            consecutive_losses: 1,
            observed_at: Utc::now() - age,
            source_partition: "nba".into(),
        }
    }

    #[tokio::test]
    async fn reads_only_inside_lookback() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("perf.db").to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        let source = SqlitePerformanceSource::new(pool);

        assert!(source.latest_observation().await.unwrap().is_none());
        source
            .insert(&[record("old", Duration::days(40)), record("new", Duration::hours(2))])
            .unwrap();

        let rows = source.read_performance(Duration::days(30)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].strategy_id, StrategyId::new("new"));
        assert_eq!(rows[0].source_partition, "nba");

        let latest = source.latest_observation().await.unwrap().unwrap();
        assert!((latest - rows[0].observed_at).num_seconds().abs() < 1);
    }
}
