//! The engine wired to SQLite through the composition root.

mod support;

use chrono::Utc;

use stratagem::adapter::outbound::sqlite::performance::SqlitePerformanceSource;
use stratagem::domain::category::StrategyCategory;
use stratagem::domain::id::StrategyId;
use stratagem::domain::lifecycle::LifecycleStatus;
use stratagem::domain::live::SnapshotOrigin;
use stratagem::domain::performance::PerformanceRecord;
use stratagem::domain::trigger::TriggerKind;
use stratagem::infrastructure::bootstrap;
use stratagem::infrastructure::config::settings::Config;
use stratagem::infrastructure::config::strategy::StrategyDecl;
use stratagem::port::inbound::control::StrategyControl;
use support::temp_db::TempDb;

fn config_for(db: &TempDb) -> Config {
    Config {
        database: db.url().to_string(),
        strategies: vec![StrategyDecl {
            id: "steam".to_string(),
            category: StrategyCategory::LineMovement,
        }],
        ..Config::default()
    }
}

fn row(id: &str, win_rate: f64, roi: f64, sample_size: u32) -> PerformanceRecord {
    PerformanceRecord {
        strategy_id: StrategyId::new(id),
        win_rate,
        roi,
        sample_size,
        consecutive_losses: 0,
        observed_at: Utc::now(),
        source_partition: "nfl".to_string(),
    }
}

#[tokio::test]
async fn cold_start_then_data_then_restart() {
    let db = TempDb::create();
    let config = config_for(&db);

    let engine = bootstrap::build_engine(&config).expect("engine");
    engine.initialize().await.expect("initialize");
    let live = engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.version().value(), 1);
    assert_eq!(live.state.origin, SnapshotOrigin::ColdStart);

    let source = SqlitePerformanceSource::new(db.pool());
    source
        .insert(&[row("steam", 0.61, 11.0, 80), row("contrarian", 0.41, -12.0, 70)])
        .expect("insert");

    let outcome = engine.refresh(TriggerKind::NewData).await.expect("refresh");
    assert!(outcome.published);
    assert_eq!(outcome.version.value(), 2);
    assert_eq!(
        engine.registry().status(&StrategyId::new("steam")),
        Some(LifecycleStatus::Active)
    );
    assert_eq!(
        engine.registry().status(&StrategyId::new("contrarian")),
        Some(LifecycleStatus::Quarantine)
    );
    assert_eq!(engine.alerts(true).await.expect("alerts").len(), 1);

    let history = engine
        .get_configuration_history(Some(&StrategyId::new("steam")), 1)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].configuration.version.value(), 2);
    assert_eq!(history[0].trigger, TriggerKind::NewData);

    engine
        .activate_kill_switch("ops", "maintenance")
        .await
        .expect("kill switch");
    drop(engine);

    let restarted = bootstrap::build_engine(&config).expect("engine");
    restarted.restore().await.expect("restore");
    assert!(restarted.state().is_kill_switch_active());
    let steam = restarted
        .registry()
        .get(&StrategyId::new("steam"))
        .expect("steam");
    assert_eq!(steam.status, LifecycleStatus::Active);
    assert_eq!(steam.category, StrategyCategory::LineMovement);
    assert!(!steam.onboarding);

    let outcome = restarted
        .refresh(TriggerKind::Startup)
        .await
        .expect("refresh");
    assert_eq!(outcome.version.value(), 3);
}

#[tokio::test]
async fn registration_from_a_second_process_is_visible_after_restore() {
    let db = TempDb::create();
    let config = config_for(&db);

    let cli = bootstrap::build_engine(&config).expect("engine");
    cli.restore().await.expect("restore");
    let created = cli
        .register_strategy(&StrategyId::new("weather"), StrategyCategory::Situational)
        .await
        .expect("register");
    assert!(created);

    let server = bootstrap::build_engine(&config).expect("engine");
    server.restore().await.expect("restore");
    let entry = server
        .registry()
        .get(&StrategyId::new("weather"))
        .expect("weather");
    assert_eq!(entry.category, StrategyCategory::Situational);
    assert_eq!(entry.status, LifecycleStatus::Probation);
    assert_eq!(server.registry().len(), 2);
}
