//! Poll-driven refresh triggers.

use chrono::Duration;

use stratagem::domain::trigger::TriggerKind;
use stratagem::testkit::domain::{healthy, record, Harness};

async fn initialized() -> Harness {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.engine.initialize().await.expect("initialize");
    h
}

#[tokio::test]
async fn debounce_suppresses_polls_right_after_a_refresh() {
    let h = initialized().await;

    let outcome = h.engine.poll(false).await.expect("poll");

    assert!(outcome.is_none());
}

#[tokio::test]
async fn newer_rows_fire_a_new_data_refresh() {
    let h = initialized().await;
    h.clock.advance(Duration::minutes(6));
    h.performance.push(healthy("alpha", h.now()));

    let outcome = h.engine.poll(false).await.expect("poll").expect("fired");

    assert_eq!(outcome.trigger, TriggerKind::NewData);
    assert!(outcome.published);
    assert_eq!(outcome.version.value(), 2);
}

#[tokio::test]
async fn quiet_store_refreshes_on_schedule() {
    let h = initialized().await;

    h.clock.advance(Duration::minutes(6));
    assert!(h.engine.poll(false).await.expect("poll").is_none());

    h.clock.advance(Duration::minutes(10));
    let outcome = h.engine.poll(false).await.expect("poll").expect("fired");
    assert_eq!(outcome.trigger, TriggerKind::Scheduled);
}

#[tokio::test]
async fn manual_override_bypasses_debounce() {
    let h = initialized().await;

    let outcome = h.engine.poll(true).await.expect("poll").expect("fired");

    assert_eq!(outcome.trigger, TriggerKind::ManualOverride);
}

#[tokio::test]
async fn sharp_roi_drop_fires_a_degradation_refresh() {
    let h = initialized().await;
    h.clock.advance(Duration::minutes(6));
    h.performance
        .set_rows(vec![record("alpha", 0.62, -4.0, 60, h.now())]);

    let outcome = h.engine.poll(false).await.expect("poll").expect("fired");

    assert_eq!(outcome.trigger, TriggerKind::PerformanceDegradation);
}

#[tokio::test]
async fn failed_refresh_still_counts_toward_debounce() {
    let h = initialized().await;
    h.store.set_failing(true);
    h.clock.advance(Duration::minutes(6));
    h.performance.push(healthy("alpha", h.now()));

    assert!(h.engine.poll(false).await.is_err());

    h.clock.advance(Duration::minutes(1));
    assert!(h.engine.poll(false).await.expect("poll").is_none());
}
