//! Time source port.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Injected wherever behavior depends on wall-clock time (day boundaries,
/// debounce windows, grace periods) so tests can drive it deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn name(&self) -> &'static str {
        "clock"
    }
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
