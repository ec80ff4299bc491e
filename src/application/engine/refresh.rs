//! One configuration refresh: read, evaluate, build, persist, publish.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::application::configuration::BuildInput;
use crate::application::trigger::TriggerInputs;
use crate::domain::alert::AlertLevel;
use crate::domain::category::StrategyCategory;
use crate::domain::configuration::{ConfigurationVersion, StrategyConfiguration};
use crate::domain::id::StrategyId;
use crate::domain::lifecycle::{LifecycleEvent, LifecycleStatus, TransitionReason};
use crate::domain::live::{DegradedReason, LiveConfiguration, LiveStrategyState, SnapshotOrigin};
use crate::domain::performance::PerformanceRecord;
use crate::domain::strategy::StrategyEntry;
use crate::domain::trigger::{TriggerKind, TriggerRecord};
use crate::error::{EngineError, Result};
use crate::port::outbound::notifier::Event;
use crate::port::outbound::store::SnapshotBatch;

use super::Engine;

/// What a refresh did.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub trigger: TriggerKind,
    pub prior_version: ConfigurationVersion,
    /// The version now live; equal to `prior_version` when nothing was published.
    pub version: ConfigurationVersion,
    pub origin: SnapshotOrigin,
    pub published: bool,
    /// Lifecycle events written with the snapshot.
    pub events: usize,
    /// Performance rows dropped as malformed.
    pub skipped_records: usize,
    pub duration_ms: u64,
}

/// Newest valid record per strategy.
#[derive(Debug, Default)]
struct Reduced {
    records: BTreeMap<StrategyId, PerformanceRecord>,
    skipped: usize,
    /// Newest observation across every row read, valid or not.
    watermark: Option<DateTime<Utc>>,
}

/// A snapshot ready to be persisted.
struct Draft {
    kind: TriggerKind,
    origin: SnapshotOrigin,
    version: ConfigurationVersion,
    derived_at: DateTime<Utc>,
    entries: Vec<StrategyEntry>,
    configurations: Vec<StrategyConfiguration>,
    events: Vec<LifecycleEvent>,
    metrics: BTreeMap<StrategyId, PerformanceRecord>,
    skipped: usize,
}

impl Engine {
    /// Run one refresh for `kind`.
    ///
    /// Refreshes are serialized. When the performance store is unreachable
    /// or empty, a data-backed snapshot already live is kept and flagged
    /// degraded; otherwise a cold-start snapshot is published.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PersistenceFailure`] when the batch could not be
    /// written after retries, and [`EngineError::InvariantViolation`] if the
    /// new version would not exceed the live one. Nothing is published in
    /// either case.
    pub async fn refresh(&self, kind: TriggerKind) -> Result<RefreshOutcome> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked(kind).await
    }

    pub(super) async fn refresh_locked(&self, kind: TriggerKind) -> Result<RefreshOutcome> {
        let started = Instant::now();
        let now = self.clock.now();
        self.trigger.lock().record_attempt(now);
        let prior = self.state.version();

        let rows = match self.performance.read_performance(self.config.lookback).await {
            Ok(rows) => rows,
            Err(e) => {
                let err = EngineError::DataUnavailable(e.to_string());
                warn!(trigger = kind.as_str(), error = %err, "Performance read failed");
                Vec::new()
            }
        };
        let reduced = reduce(rows);

        if reduced.records.is_empty() {
            if self.state.snapshot().origin == SnapshotOrigin::Performance {
                self.mark_degraded(DegradedReason::PerformanceUnavailable).await;
                return Ok(RefreshOutcome {
                    trigger: kind,
                    prior_version: prior,
                    version: prior,
                    origin: SnapshotOrigin::Performance,
                    published: false,
                    events: 0,
                    skipped_records: reduced.skipped,
                    duration_ms: elapsed_ms(started),
                });
            }
            let draft = self.cold_start_draft(kind, now, reduced.skipped);
            let outcome = self.commit(draft, prior, started).await?;
            self.trigger.lock().record_success(now, reduced.watermark, &[]);
            return Ok(outcome);
        }

        let fresh: Vec<PerformanceRecord> = reduced.records.values().cloned().collect();
        let draft = self.performance_draft(kind, now, reduced.records, reduced.skipped);
        let outcome = self.commit(draft, prior, started).await?;
        self.trigger.lock().record_success(now, reduced.watermark, &fresh);
        Ok(outcome)
    }

    /// Check for new data, ask the trigger controller, and refresh if it fires.
    ///
    /// # Errors
    ///
    /// Propagates refresh errors.
    pub async fn poll(&self, manual_override: bool) -> Result<Option<RefreshOutcome>> {
        let latest = match self.performance.latest_observation().await {
            Ok(latest) => latest,
            Err(e) => {
                debug!(error = %e, "Watermark query failed");
                None
            }
        };

        let has_new_data = self.trigger.lock().has_new_data(latest);
        let fresh: Option<Vec<PerformanceRecord>> = if has_new_data && !manual_override {
            match self.performance.read_performance(self.config.lookback).await {
                Ok(rows) => Some(reduce(rows).records.into_values().collect()),
                Err(e) => {
                    debug!(error = %e, "Fresh read for degradation check failed");
                    None
                }
            }
        } else {
            None
        };

        let inputs = TriggerInputs {
            manual_override,
            latest_observation: latest,
            fresh_records: fresh.as_deref(),
        };
        let now = self.clock.now();
        let decision = self.trigger.lock().decide(inputs, now);

        match decision {
            Some(kind) => {
                debug!(trigger = kind.as_str(), "Update trigger fired");
                self.refresh(kind).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// The live configuration, flagged stale when no refresh has landed
    /// within the staleness ceiling.
    #[must_use]
    pub fn live_configuration(&self) -> LiveConfiguration {
        let mut live = self.state.live_configuration();
        if live.degraded {
            return live;
        }
        let reason = if live.state.origin == SnapshotOrigin::Empty {
            Some(DegradedReason::ColdStart)
        } else {
            let age = self.clock.now() - live.state.derived_at;
            (age >= self.config.trigger.staleness_ceiling).then_some(DegradedReason::Stale)
        };
        if reason.is_some() {
            live.degraded = true;
            live.degraded_reason = reason;
        }
        live
    }

    /// Publish the registry as it stands against the metrics already live.
    /// Caller holds the refresh lock.
    pub(super) async fn republish_locked(&self, kind: TriggerKind) -> Result<RefreshOutcome> {
        let started = Instant::now();
        let now = self.clock.now();
        let prior = self.state.version();
        let snapshot = self.state.snapshot();

        let draft = if snapshot.origin == SnapshotOrigin::Performance {
            let working = self.working_entries();
            let version = self.allocate_version();
            let configurations =
                self.build_all(&working, &snapshot.metrics, &snapshot, false, version, now);
            Draft {
                kind,
                origin: SnapshotOrigin::Performance,
                version,
                derived_at: now,
                entries: working.into_values().collect(),
                configurations,
                events: Vec::new(),
                metrics: snapshot.metrics.clone(),
                skipped: 0,
            }
        } else {
            self.cold_start_draft(kind, now, 0)
        };
        self.commit(draft, prior, started).await
    }

    fn cold_start_draft(&self, kind: TriggerKind, now: DateTime<Utc>, skipped: usize) -> Draft {
        let mut working = self.working_entries();
        let mut events = Vec::new();
        for (id, category) in self.bootstrapper.fallback() {
            if !working.contains_key(id) {
                let entry = self.bootstrapper.entry(id.clone(), *category, now);
                events.push(registration(&entry, now));
                working.insert(id.clone(), entry);
            }
        }

        let version = self.allocate_version();
        let configurations = self
            .bootstrapper
            .configure_all(working.values(), version, now);

        Draft {
            kind,
            origin: SnapshotOrigin::ColdStart,
            version,
            derived_at: now,
            entries: working.into_values().collect(),
            configurations,
            events,
            metrics: BTreeMap::new(),
            skipped,
        }
    }

    fn performance_draft(
        &self,
        kind: TriggerKind,
        now: DateTime<Utc>,
        records: BTreeMap<StrategyId, PerformanceRecord>,
        skipped: usize,
    ) -> Draft {
        let mut working = self.working_entries();
        let mut events = Vec::new();
        let grace_days = self.config.thresholds.grace_days;

        for id in records.keys() {
            if !working.contains_key(id) {
                let entry =
                    StrategyEntry::new(id.clone(), StrategyCategory::Uncategorized, now, grace_days);
                info!(strategy = %id, "Auto-registering strategy seen in performance data");
                events.push(registration(&entry, now));
                working.insert(id.clone(), entry);
            }
        }

        for entry in working.values_mut() {
            let Some(record) = records.get(&entry.id) else {
                continue;
            };
            let resolution = self.evaluator.resolve(entry, record, now);
            if resolution.changed() {
                events.push(LifecycleEvent {
                    strategy_id: entry.id.clone(),
                    previous_status: Some(resolution.previous),
                    new_status: resolution.status,
                    reason: resolution.reason,
                    performance: Some(record.snapshot()),
                    timestamp: now,
                });
            }
        }

        let version = self.allocate_version();
        let previous = self.state.snapshot();
        let configurations = self.build_all(&working, &records, &previous, true, version, now);

        Draft {
            kind,
            origin: SnapshotOrigin::Performance,
            version,
            derived_at: now,
            entries: working.into_values().collect(),
            configurations,
            events,
            metrics: records,
            skipped,
        }
    }

    /// Build every working entry's configuration.
    ///
    /// A strategy without a record of at least `min_samples` keeps the
    /// configuration in `previous` while its status holds. When `evaluated`,
    /// a retained ACTIVE strategy sitting below probation decays one step.
    fn build_all(
        &self,
        working: &BTreeMap<StrategyId, StrategyEntry>,
        records: &BTreeMap<StrategyId, PerformanceRecord>,
        previous: &LiveStrategyState,
        evaluated: bool,
        version: ConfigurationVersion,
        now: DateTime<Utc>,
    ) -> Vec<StrategyConfiguration> {
        let fallback = self.bootstrapper.tuning();
        let min_samples = self.evaluator.thresholds().min_samples;
        working
            .values()
            .map(|entry| {
                let raw = records.get(&entry.id);
                let record = raw.filter(|r| r.sample_size >= min_samples && r.validate().is_ok());
                let decays = evaluated
                    && raw.is_some()
                    && record.is_none()
                    && entry.counters.cycles_below_probation > 0;
                let input = BuildInput {
                    strategy_id: &entry.id,
                    status: entry.status,
                    record,
                    previous: previous.get(&entry.id),
                    cycles_below_probation: entry.counters.cycles_below_probation,
                    decay_steps: u32::from(decays),
                    fallback,
                };
                self.builder.build(input, version, now)
            })
            .collect()
    }

    fn working_entries(&self) -> BTreeMap<StrategyId, StrategyEntry> {
        self.registry
            .entries()
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect()
    }

    /// Persist then publish. Nothing becomes visible unless it is durable.
    async fn commit(
        &self,
        draft: Draft,
        prior: ConfigurationVersion,
        started: Instant,
    ) -> Result<RefreshOutcome> {
        let current = self.state.version();
        if draft.version <= current {
            error!(
                current = current.value(),
                proposed = draft.version.value(),
                "Version regression rejected"
            );
            return Err(EngineError::InvariantViolation {
                current,
                proposed: draft.version,
            }
            .into());
        }

        let batch = SnapshotBatch {
            version: draft.version,
            trigger: TriggerRecord {
                kind: draft.kind,
                fired_at: draft.derived_at,
                prior_version: prior,
                new_version: draft.version,
                strategies_affected: u32::try_from(draft.configurations.len())
                    .unwrap_or(u32::MAX),
                duration_ms: elapsed_ms(started),
            },
            configurations: draft.configurations,
            events: draft.events,
            strategies: draft.entries,
        };

        let persisted = self
            .config
            .retry
            .run("persist_snapshot", || self.store.persist_snapshot(&batch))
            .await;
        if let Err(err) = persisted {
            error!(
                version = batch.version.value(),
                trigger = draft.kind.as_str(),
                error = %err,
                "Configuration snapshot not persisted; keeping previous version"
            );
            self.state.set_degraded(Some(DegradedReason::PersistenceFailed));
            self.raise(
                None,
                AlertLevel::Critical,
                format!("configuration {} was not persisted: {err}", batch.version),
            )
            .await;
            return Err(err.into());
        }

        let SnapshotBatch {
            version,
            configurations,
            events,
            strategies,
            ..
        } = batch;
        self.registry.commit(strategies);

        let live = LiveStrategyState {
            version,
            derived_at: draft.derived_at,
            trigger: draft.kind,
            origin: draft.origin,
            configurations: configurations
                .into_iter()
                .map(|c| (c.strategy_id.clone(), c))
                .collect(),
            metrics: draft.metrics,
        };
        let published = self.state.publish(live)?;
        self.state.set_degraded(match draft.origin {
            SnapshotOrigin::Performance => None,
            _ => Some(DegradedReason::ColdStart),
        });

        let summary = published.summary();
        info!(
            version = version.value(),
            prior = prior.value(),
            trigger = draft.kind.as_str(),
            origin = ?draft.origin,
            total = summary.total,
            enabled = summary.enabled,
            events = events.len(),
            skipped = draft.skipped,
            "Configuration published"
        );

        let event_count = events.len();
        for event in events {
            let alert_worthy = event.is_downgrade()
                && matches!(
                    event.new_status,
                    LifecycleStatus::Quarantine | LifecycleStatus::CircuitBreakerOpen
                );
            if alert_worthy {
                let message = format!(
                    "{} moved to {}: {}",
                    event.strategy_id, event.new_status, event.reason
                );
                self.raise(Some(event.strategy_id.clone()), AlertLevel::Warning, message)
                    .await;
            }
            self.notifiers.notify_all(Event::StatusChanged(event));
        }
        self.notifiers.notify_all(Event::ConfigurationPublished {
            version,
            trigger: draft.kind,
            enabled: summary.enabled,
            total: summary.total,
        });

        Ok(RefreshOutcome {
            trigger: draft.kind,
            prior_version: prior,
            version,
            origin: draft.origin,
            published: true,
            events: event_count,
            skipped_records: draft.skipped,
            duration_ms: elapsed_ms(started),
        })
    }

    /// Flag the live configuration degraded, alerting on the first cycle of
    /// each new condition.
    async fn mark_degraded(&self, reason: DegradedReason) {
        if self.state.degraded_reason() == Some(reason) {
            return;
        }
        self.state.set_degraded(Some(reason));
        self.raise(
            None,
            AlertLevel::Warning,
            format!(
                "serving configuration {} degraded: {}",
                self.state.version(),
                reason.as_str()
            ),
        )
        .await;
    }
}

/// Drop malformed rows and keep the newest valid row per strategy.
fn reduce(rows: Vec<PerformanceRecord>) -> Reduced {
    let mut reduced = Reduced::default();
    for row in rows {
        reduced.watermark = reduced.watermark.max(Some(row.observed_at));
        if let Err(reason) = row.validate() {
            let err = EngineError::MalformedRecord {
                strategy_id: row.strategy_id.clone(),
                reason,
            };
            warn!(error = %err, "Skipping performance row");
            reduced.skipped += 1;
            continue;
        }
        match reduced.records.get(&row.strategy_id) {
            Some(existing) if existing.observed_at >= row.observed_at => {}
            _ => {
                reduced.records.insert(row.strategy_id.clone(), row);
            }
        }
    }
    reduced
}

fn registration(entry: &StrategyEntry, now: DateTime<Utc>) -> LifecycleEvent {
    LifecycleEvent {
        strategy_id: entry.id.clone(),
        previous_status: None,
        new_status: entry.status,
        reason: TransitionReason::Registered,
        performance: None,
        timestamp: now,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
