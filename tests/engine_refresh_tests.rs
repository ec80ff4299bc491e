//! Refresh pipeline: cold start, publication, degradation and persistence.

use chrono::Duration;

use stratagem::application::configuration::BootstrapPolicy;
use stratagem::domain::alert::AlertLevel;
use stratagem::domain::category::StrategyCategory;
use stratagem::domain::configuration::ConfigurationVersion;
use stratagem::domain::id::StrategyId;
use stratagem::domain::lifecycle::LifecycleStatus;
use stratagem::domain::live::{DegradedReason, SnapshotOrigin};
use stratagem::domain::trigger::TriggerKind;
use stratagem::error::{EngineError, Error};
use stratagem::port::inbound::control::StrategyControl;
use stratagem::port::inbound::gate::GateReason;
use stratagem::port::outbound::notifier::Event;
use stratagem::port::outbound::store::ConfigurationStore;
use stratagem::testkit::domain::{declared, healthy, losing, record, test_config, Harness};

fn v(n: u64) -> ConfigurationVersion {
    ConfigurationVersion::new(n)
}

fn id(s: &str) -> StrategyId {
    StrategyId::new(s)
}

#[tokio::test]
async fn cold_start_stages_conservative_tuning_for_known_strategies() {
    let mut config = test_config();
    config.strategies = declared(&["alpha", "beta"]);
    config.bootstrap = BootstrapPolicy {
        fallback: vec![(id("gamma"), StrategyCategory::SharpMoney)],
        ..BootstrapPolicy::default()
    };
    let h = Harness::with_config(config);

    h.engine.initialize().await.expect("initialize");

    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.version(), v(1));
    assert_eq!(live.state.origin, SnapshotOrigin::ColdStart);
    assert!(live.degraded);
    assert_eq!(live.degraded_reason, Some(DegradedReason::ColdStart));
    assert_eq!(live.state.configurations.len(), 3);

    for config in live.state.configurations.values() {
        assert_eq!(config.status, LifecycleStatus::Probation);
        assert!(!config.is_enabled());
        let staged = config.staged_tuning().expect("staged tuning");
        assert_eq!(staged.confidence_multiplier, 0.8);
        assert_eq!(staged.max_emissions_per_period, 1);
    }

    let gamma = h.engine.registry().get(&id("gamma")).expect("fallback registered");
    assert_eq!(gamma.category, StrategyCategory::SharpMoney);
    assert_eq!(gamma.grace_days, 14);

    let gate = h.engine.check_gate(&id("alpha"));
    assert!(!gate.allowed);
    assert_eq!(
        gate.reason,
        GateReason::Inactive {
            status: LifecycleStatus::Probation
        }
    );
}

#[tokio::test]
async fn performance_data_publishes_tuned_configuration() {
    let mut config = test_config();
    config.strategies = declared(&["alpha"]);
    let h = Harness::with_config(config);
    h.performance.set_rows(vec![healthy("alpha", h.now())]);

    h.engine.initialize().await.expect("initialize");

    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.version(), v(1));
    assert_eq!(live.state.origin, SnapshotOrigin::Performance);
    assert!(!live.degraded);

    let alpha = live.state.get(&id("alpha")).expect("alpha configured");
    assert_eq!(alpha.status, LifecycleStatus::Active);
    let tuning = alpha.tuning().expect("enabled");
    assert!((tuning.confidence_multiplier - 1.10).abs() < 1e-9);
    assert_eq!(tuning.threshold_adjustment, 0.0);
    assert!((tuning.ensemble_weight - (0.5 + 12.0 / 45.0)).abs() < 1e-9);
    assert_eq!(tuning.max_emissions_per_period, 6);

    assert_eq!(h.store.persisted_versions(), vec![v(1)]);
    let batch = &h.store.batches()[0];
    assert_eq!(batch.trigger.kind, TriggerKind::Startup);
    assert_eq!(batch.trigger.prior_version, v(0));
    assert_eq!(batch.trigger.new_version, v(1));
}

#[tokio::test]
async fn unseen_strategies_in_performance_data_are_auto_registered() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("delta", h.now())]);

    h.engine.initialize().await.expect("initialize");

    let entry = h.engine.registry().get(&id("delta")).expect("auto-registered");
    assert_eq!(entry.category, StrategyCategory::Uncategorized);
    assert_eq!(entry.status, LifecycleStatus::Active);
    assert!(!entry.onboarding);
}

#[tokio::test]
async fn malformed_rows_are_skipped_without_failing_the_cycle() {
    let h = Harness::new();
    let now = h.now();
    h.performance.set_rows(vec![
        healthy("alpha", now),
        record("beta", 1.5, 3.0, 30, now),
        record("gamma", 0.5, f64::NAN, 30, now),
    ]);

    let outcome = h.engine.refresh(TriggerKind::Startup).await.expect("refresh");

    assert!(outcome.published);
    assert_eq!(outcome.skipped_records, 2);
    assert!(h.engine.registry().get(&id("beta")).is_none());
    assert!(h.engine.registry().get(&id("alpha")).is_some());
}

#[tokio::test]
async fn unreachable_store_keeps_last_snapshot_and_flags_it() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.engine.initialize().await.expect("initialize");

    h.performance.set_unreachable(true);
    h.clock.advance(Duration::minutes(20));
    let outcome = h.engine.refresh(TriggerKind::Scheduled).await.expect("refresh");

    assert!(!outcome.published);
    assert_eq!(outcome.version, v(1));
    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.version(), v(1));
    assert_eq!(live.degraded_reason, Some(DegradedReason::PerformanceUnavailable));
    assert!(live.state.get(&id("alpha")).expect("kept").is_enabled());

    // A second failed cycle does not raise the same alert again.
    h.engine.refresh(TriggerKind::Scheduled).await.expect("refresh");
    let alerts = h.store.alerts(true).await.expect("alerts");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);

    h.performance.set_unreachable(false);
    let outcome = h.engine.refresh(TriggerKind::Scheduled).await.expect("refresh");
    assert_eq!(outcome.version, v(2));
    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert!(!live.degraded);
}

#[tokio::test]
async fn persistence_failure_keeps_previous_version_and_never_reuses_numbers() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.engine.initialize().await.expect("initialize");

    h.store.set_failing(true);
    let attempts_before = h.store.write_attempts();
    let err = h
        .engine
        .refresh(TriggerKind::Scheduled)
        .await
        .expect_err("write should fail");
    assert!(matches!(
        err,
        Error::Engine(EngineError::PersistenceFailure { attempts: 3, .. })
    ));
    // Three snapshot attempts plus the best-effort alert write.
    assert_eq!(h.store.write_attempts() - attempts_before, 4);

    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.version(), v(1));
    assert_eq!(live.degraded_reason, Some(DegradedReason::PersistenceFailed));
    let critical = h.notifier.count(|e| {
        matches!(e, Event::AlertRaised(a) if a.level == AlertLevel::Critical)
    });
    assert_eq!(critical, 1);

    h.store.set_failing(false);
    let outcome = h.engine.refresh(TriggerKind::Scheduled).await.expect("refresh");
    assert_eq!(outcome.prior_version, v(1));
    assert_eq!(outcome.version, v(3));
    assert_eq!(h.store.persisted_versions(), vec![v(1), v(3)]);
}

#[tokio::test]
async fn transient_write_failures_are_retried() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.store.fail_next_writes(2);

    let outcome = h.engine.refresh(TriggerKind::Startup).await.expect("refresh");

    assert!(outcome.published);
    assert_eq!(h.store.persisted_versions(), vec![v(1)]);
}

#[tokio::test]
async fn downgrade_into_quarantine_raises_warning_alert() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.engine.initialize().await.expect("initialize");

    h.clock.advance(Duration::hours(1));
    h.performance.set_rows(vec![losing("alpha", h.now())]);
    let outcome = h.engine.refresh(TriggerKind::NewData).await.expect("refresh");
    assert_eq!(outcome.events, 1);

    let live = h.engine.get_live_configuration(false).await.expect("live");
    let alpha = live.state.get(&id("alpha")).expect("alpha");
    assert_eq!(alpha.status, LifecycleStatus::Quarantine);
    assert!(!alpha.is_enabled());

    let alerts = h.store.alerts(true).await.expect("alerts");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].strategy_id, Some(id("alpha")));
    assert_eq!(alerts[0].level, AlertLevel::Warning);

    let acknowledged = h
        .engine
        .acknowledge_alert(&alerts[0].id)
        .await
        .expect("ack");
    assert!(acknowledged);
    assert!(h.engine.alerts(true).await.expect("alerts").is_empty());
    assert_eq!(h.engine.alerts(false).await.expect("alerts").len(), 1);
}

#[tokio::test]
async fn restart_resumes_versions_statuses_and_kill_switch() {
    let mut config = test_config();
    config.strategies = declared(&["alpha"]);
    let first = Harness::with_config(config.clone());
    first.performance.set_rows(vec![healthy("alpha", first.now())]);
    first.engine.initialize().await.expect("initialize");
    first
        .engine
        .refresh(TriggerKind::Scheduled)
        .await
        .expect("refresh");
    first
        .engine
        .activate_kill_switch("ops", "incident")
        .await
        .expect("kill switch");

    let second = first.restarted(config);
    second.engine.initialize().await.expect("initialize");

    let live = second.engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.version(), v(3));
    assert_eq!(
        second.engine.registry().status(&id("alpha")),
        Some(LifecycleStatus::Active)
    );
    assert!(second.engine.state().is_kill_switch_active());
    assert_eq!(
        second.engine.check_gate(&id("alpha")).reason,
        GateReason::KillSwitchActive
    );
}

#[tokio::test]
async fn stale_configuration_is_flagged() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.engine.initialize().await.expect("initialize");

    h.clock.advance(Duration::hours(5));

    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert!(live.degraded);
    assert_eq!(live.degraded_reason, Some(DegradedReason::Stale));

    let live = h.engine.get_live_configuration(true).await.expect("live");
    assert!(!live.degraded);
    assert_eq!(live.state.trigger, TriggerKind::ManualOverride);
}

#[tokio::test]
async fn history_is_filtered_by_strategy_and_window() {
    let mut config = test_config();
    config.strategies = declared(&["alpha", "beta"]);
    let h = Harness::with_config(config);
    h.performance
        .set_rows(vec![healthy("alpha", h.now()), healthy("beta", h.now())]);
    h.engine.initialize().await.expect("initialize");

    h.clock.advance(Duration::days(3));
    h.engine
        .refresh(TriggerKind::Scheduled)
        .await
        .expect("refresh");

    let all = h
        .engine
        .get_configuration_history(None, 7)
        .await
        .expect("history");
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].configuration.version, v(2));

    let alpha_recent = h
        .engine
        .get_configuration_history(Some(&id("alpha")), 1)
        .await
        .expect("history");
    assert_eq!(alpha_recent.len(), 1);
    assert_eq!(alpha_recent[0].configuration.strategy_id, id("alpha"));
    assert_eq!(alpha_recent[0].trigger, TriggerKind::Scheduled);
}
