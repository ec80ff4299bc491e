//! Performance store port.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::performance::PerformanceRecord;
use crate::error::Result;

/// Reader over aggregated performance rows produced by the measurement
/// subsystem.
///
/// Any error is treated by the engine as the store being unreachable.
#[async_trait]
pub trait PerformanceSource: Send + Sync {
    /// Rows observed within `lookback` of now. May contain several rows per
    /// strategy; the engine keeps the newest.
    async fn read_performance(&self, lookback: Duration) -> Result<Vec<PerformanceRecord>>;

    /// Timestamp of the newest row, used as the new-data watermark.
    async fn latest_observation(&self) -> Result<Option<DateTime<Utc>>>;
}
