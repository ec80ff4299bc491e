//! Loading configuration files from disk.

use std::time::Duration;

use stratagem::domain::category::StrategyCategory;
use stratagem::domain::id::StrategyId;
use stratagem::error::{ConfigError, Error};
use stratagem::infrastructure::config::settings::Config;

fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).expect("write config");
    (dir, path)
}

#[test]
fn full_file_maps_onto_engine_config() {
    let (_dir, path) = write(
        r#"
        database = "/var/lib/stratagem/engine.db"

        [logging]
        level = "debug"
        format = "json"

        [lifecycle]
        hard_roi_floor = -12.0
        consecutive_loss_threshold = 6
        evaluation_window_hours = 12

        [builder]
        decay_rate = 0.1

        [trigger]
        debounce_mins = 2
        poll_interval_secs = 10
        lookback_days = 14

        [execution]
        strategy_timeout_ms = 500
        cycle_timeout_ms = 5000
        signals_dir = "/var/lib/stratagem/signals"

        [persistence]
        max_attempts = 5

        [[strategies]]
        id = "steam"
        category = "line_movement"

        [[bootstrap.fallback]]
        id = "steam"
        category = "line_movement"
        "#,
    );

    let config = Config::load(&path).expect("load");
    assert_eq!(config.logging.format, "json");
    assert_eq!(
        config.execution.signals_dir.as_deref(),
        Some("/var/lib/stratagem/signals")
    );

    let engine = config.engine_config();
    assert_eq!(engine.thresholds.hard_roi_floor, -12.0);
    assert_eq!(engine.thresholds.consecutive_loss_threshold, 6);
    assert_eq!(engine.thresholds.evaluation_window, chrono::Duration::hours(12));
    assert_eq!(engine.builder.decay_rate, 0.1);
    assert_eq!(engine.trigger.debounce, chrono::Duration::minutes(2));
    assert_eq!(engine.poll_interval, Duration::from_secs(10));
    assert_eq!(engine.lookback, chrono::Duration::days(14));
    assert_eq!(engine.execution.strategy_timeout, Duration::from_millis(500));
    assert_eq!(engine.retry.max_attempts, 5);
    assert_eq!(
        engine.strategies,
        vec![(StrategyId::new("steam"), StrategyCategory::LineMovement)]
    );
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("temp dir");

    let err = Config::load(dir.path().join("absent.toml")).expect_err("missing file");

    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = write("database = \n");

    let err = Config::load(&path).expect_err("malformed");

    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[test]
fn conflicting_categories_for_one_id_are_rejected() {
    let (_dir, path) = write(
        r#"
        [[strategies]]
        id = "steam"
        category = "line_movement"

        [[bootstrap.fallback]]
        id = "steam"
        category = "sharp_money"
        "#,
    );

    let err = Config::load(&path).expect_err("conflict");

    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidValue {
            field: "strategies.category",
            ..
        })
    ));
}

#[test]
fn empty_database_path_is_rejected() {
    let (_dir, path) = write("database = \"  \"\n");

    let err = Config::load(&path).expect_err("empty database");

    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingField { field: "database" })
    ));
}
