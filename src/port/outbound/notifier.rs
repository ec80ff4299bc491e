//! Notifier port for engine events.
//!
//! Notifications are fire-and-forget: the engine never waits on them and a
//! failing notifier cannot affect a cycle.

use crate::domain::alert::{Alert, KillSwitchAudit};
use crate::domain::configuration::ConfigurationVersion;
use crate::domain::lifecycle::LifecycleEvent;
use crate::domain::trigger::TriggerKind;

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// A strategy's lifecycle status changed.
    StatusChanged(LifecycleEvent),
    /// The process-wide kill switch was toggled.
    KillSwitch(KillSwitchAudit),
    /// An operator alert was raised.
    AlertRaised(Alert),
    /// A new configuration version went live.
    ConfigurationPublished {
        version: ConfigurationVersion,
        trigger: TriggerKind,
        enabled: usize,
        total: usize,
    },
}

/// Trait for notification handlers.
///
/// `notify` should return quickly; implementations doing slow I/O should
/// spawn a task.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{error, info, warn};
        match event {
            Event::StatusChanged(e) => {
                let previous = e
                    .previous_status
                    .map_or_else(|| "-".to_string(), |s| s.to_string());
                if e.is_downgrade() {
                    warn!(
                        strategy = %e.strategy_id,
                        from = %previous,
                        to = %e.new_status,
                        reason = %e.reason,
                        "Strategy downgraded"
                    );
                } else {
                    info!(
                        strategy = %e.strategy_id,
                        from = %previous,
                        to = %e.new_status,
                        reason = %e.reason,
                        "Strategy status changed"
                    );
                }
            }
            Event::KillSwitch(audit) => {
                warn!(
                    action = audit.action.as_str(),
                    by = %audit.actor,
                    reason = audit.reason.as_deref().unwrap_or(""),
                    "Kill switch toggled"
                );
            }
            Event::AlertRaised(alert) => {
                let strategy = alert
                    .strategy_id
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string);
                match alert.level {
                    crate::domain::alert::AlertLevel::Critical => {
                        error!(strategy = %strategy, message = %alert.message, "CRITICAL alert");
                    }
                    crate::domain::alert::AlertLevel::Warning => {
                        warn!(strategy = %strategy, message = %alert.message, "Alert");
                    }
                    crate::domain::alert::AlertLevel::Info => {
                        info!(strategy = %strategy, message = %alert.message, "Alert");
                    }
                }
            }
            Event::ConfigurationPublished {
                version,
                trigger,
                enabled,
                total,
            } => {
                info!(
                    version = version.value(),
                    trigger = trigger.as_str(),
                    enabled,
                    total,
                    "Configuration published"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Counting(Arc<AtomicUsize>);

    impl Notifier for Counting {
        fn notify(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registry_broadcasts_to_every_notifier() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotifierRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(LogNotifier));

        registry.notify_all(Event::ConfigurationPublished {
            version: ConfigurationVersion::new(1),
            trigger: TriggerKind::Scheduled,
            enabled: 0,
            total: 0,
        });

        assert_eq!(registry.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
