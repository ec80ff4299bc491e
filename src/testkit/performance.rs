//! Scripted performance source.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::domain::performance::PerformanceRecord;
use crate::error::{Error, Result};
use crate::port::outbound::performance::PerformanceSource;

/// Returns whatever rows were last set, ignoring the lookback. Can be told
/// to fail as if the store were unreachable.
#[derive(Debug, Default)]
pub struct ScriptedPerformanceSource {
    rows: Mutex<Vec<PerformanceRecord>>,
    unreachable: AtomicBool,
    reads: AtomicU32,
}

impl ScriptedPerformanceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<PerformanceRecord>) -> Self {
        let source = Self::new();
        source.set_rows(rows);
        source
    }

    pub fn set_rows(&self, rows: Vec<PerformanceRecord>) {
        *self.rows.lock() = rows;
    }

    pub fn push(&self, row: PerformanceRecord) {
        self.rows.lock().push(row);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Calls to `read_performance` so far.
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Connection("performance store unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PerformanceSource for ScriptedPerformanceSource {
    async fn read_performance(&self, _lookback: Duration) -> Result<Vec<PerformanceRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.rows.lock().clone())
    }

    async fn latest_observation(&self) -> Result<Option<DateTime<Utc>>> {
        self.check()?;
        Ok(self.rows.lock().iter().map(|r| r.observed_at).max())
    }
}
