//! Shared engine state.
//!
//! The live configuration is an `Arc` swapped under a write lock; readers
//! clone the `Arc` and keep one version for the duration of their call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::configuration::ConfigurationVersion;
use crate::domain::live::{DegradedReason, LiveConfiguration, LiveStrategyState};
use crate::error::EngineError;

pub struct EngineState {
    live: RwLock<Arc<LiveStrategyState>>,
    /// Kill switch - when true, every gate check is blocked.
    kill_switch: AtomicBool,
    kill_switch_reason: RwLock<Option<String>>,
    degraded: RwLock<Option<DegradedReason>>,
}

impl EngineState {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            live: RwLock::new(Arc::new(LiveStrategyState::empty(now))),
            kill_switch: AtomicBool::new(false),
            kill_switch_reason: RwLock::new(None),
            degraded: RwLock::new(None),
        }
    }

    /// The currently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<LiveStrategyState> {
        Arc::clone(&self.live.read())
    }

    #[must_use]
    pub fn version(&self) -> ConfigurationVersion {
        self.live.read().version
    }

    /// Swap in a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] and keeps the current
    /// snapshot if `next.version` is not strictly greater.
    pub fn publish(&self, next: LiveStrategyState) -> Result<Arc<LiveStrategyState>, EngineError> {
        let mut live = self.live.write();
        if next.version <= live.version {
            return Err(EngineError::InvariantViolation {
                current: live.version,
                proposed: next.version,
            });
        }
        let next = Arc::new(next);
        *live = Arc::clone(&next);
        Ok(next)
    }

    #[must_use]
    pub fn is_kill_switch_active(&self) -> bool {
        self.kill_switch.load(Ordering::SeqCst)
    }

    pub fn activate_kill_switch(&self, reason: impl Into<String>) {
        self.kill_switch.store(true, Ordering::SeqCst);
        *self.kill_switch_reason.write() = Some(reason.into());
    }

    pub fn deactivate_kill_switch(&self) {
        self.kill_switch.store(false, Ordering::SeqCst);
        *self.kill_switch_reason.write() = None;
    }

    #[must_use]
    pub fn kill_switch_reason(&self) -> Option<String> {
        self.kill_switch_reason.read().clone()
    }

    #[must_use]
    pub fn degraded_reason(&self) -> Option<DegradedReason> {
        *self.degraded.read()
    }

    pub fn set_degraded(&self, reason: Option<DegradedReason>) {
        *self.degraded.write() = reason;
    }

    /// Current snapshot with its degradation flag.
    #[must_use]
    pub fn live_configuration(&self) -> LiveConfiguration {
        let state = self.snapshot();
        let reason = self.degraded_reason();
        LiveConfiguration {
            state,
            degraded: reason.is_some(),
            degraded_reason: reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::live::SnapshotOrigin;
    use crate::domain::trigger::TriggerKind;

    fn state_at(version: u64) -> LiveStrategyState {
        let mut state = LiveStrategyState::empty(Utc::now());
        state.version = ConfigurationVersion::new(version);
        state.origin = SnapshotOrigin::Performance;
        state.trigger = TriggerKind::Scheduled;
        state
    }

    #[test]
    fn publish_rejects_version_regression() {
        let engine = EngineState::new(Utc::now());
        assert!(engine.publish(state_at(2)).is_ok());
        let err = engine.publish(state_at(2)).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation { .. }));
        assert!(engine.publish(state_at(1)).is_err());
        assert_eq!(engine.version(), ConfigurationVersion::new(2));
    }

    #[test]
    fn readers_keep_their_version() {
        let engine = EngineState::new(Utc::now());
        engine.publish(state_at(1)).unwrap();
        let held = engine.snapshot();
        engine.publish(state_at(2)).unwrap();
        assert_eq!(held.version, ConfigurationVersion::new(1));
        assert_eq!(engine.snapshot().version, ConfigurationVersion::new(2));
    }

    #[test]
    fn kill_switch_toggles() {
        let engine = EngineState::new(Utc::now());
        engine.activate_kill_switch("manual");
        assert!(engine.is_kill_switch_active());
        assert_eq!(engine.kill_switch_reason().as_deref(), Some("manual"));
        engine.deactivate_kill_switch();
        assert!(!engine.is_kill_switch_active());
    }

    #[test]
    fn degraded_flag_follows_reason() {
        let engine = EngineState::new(Utc::now());
        assert!(!engine.live_configuration().degraded);
        engine.set_degraded(Some(DegradedReason::ColdStart));
        let live = engine.live_configuration();
        assert!(live.degraded);
        assert_eq!(live.degraded_reason, Some(DegradedReason::ColdStart));
    }
}
