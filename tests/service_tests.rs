//! Background engine loop.

use std::sync::Arc;
use std::time::Duration;

use stratagem::application::engine::EngineService;
use stratagem::domain::trigger::TriggerKind;
use stratagem::port::inbound::control::StrategyControl;
use stratagem::testkit::domain::{healthy, signal, Harness};
use stratagem::testkit::executor::Script;

#[tokio::test]
async fn manual_request_refreshes_and_runs_a_cycle() {
    let h = Harness::new();
    h.performance.set_rows(vec![healthy("alpha", h.now())]);
    h.engine.initialize().await.expect("initialize");
    h.executor.script(
        "alpha",
        Script::Signals(vec![signal("alpha", "game-1", "moneyline", "home", 0.8)]),
    );

    let (handle, mut reports) = EngineService::new(Arc::clone(&h.engine)).start();
    assert!(handle.request_refresh("operator"));

    let report = tokio::time::timeout(Duration::from_secs(5), reports.recv())
        .await
        .expect("report in time")
        .expect("loop alive");

    assert_eq!(report.version.value(), 2);
    assert_eq!(report.executed, 1);
    assert_eq!(report.decisions.len(), 1);

    let live = h.engine.get_live_configuration(false).await.expect("live");
    assert_eq!(live.state.trigger, TriggerKind::ManualOverride);

    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_the_report_channel() {
    let h = Harness::new();
    h.engine.initialize().await.expect("initialize");

    let (handle, mut reports) = EngineService::new(Arc::clone(&h.engine)).start();
    handle.shutdown().await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while reports.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}
