//! Background engine loop.
//!
//! ```text
//! interval / override --> Engine::poll --> refresh? --> Engine::run_cycle
//!                                                            |
//!                                                            v
//!                                                       CycleReport
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{CycleReport, Engine};

/// Handle for controlling the engine loop.
pub struct EngineHandle {
    shutdown_tx: mpsc::Sender<()>,
    override_tx: mpsc::Sender<String>,
}

impl EngineHandle {
    /// Signal the loop to stop after its current tick.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Ask for a manual-override refresh on the next loop turn.
    ///
    /// Returns `false` if the loop is gone or a request is already queued.
    pub fn request_refresh(&self, reason: impl Into<String>) -> bool {
        self.override_tx.try_send(reason.into()).is_ok()
    }
}

pub struct EngineService {
    engine: Arc<Engine>,
}

impl EngineService {
    #[must_use]
    pub const fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Spawn the loop. Each poll tick consults the trigger controller; every
    /// refresh is followed by an execution cycle whose report is sent on the
    /// returned channel.
    pub fn start(self) -> (EngineHandle, mpsc::Receiver<CycleReport>) {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (override_tx, mut override_rx) = mpsc::channel::<String>(1);
        let (report_tx, report_rx) = mpsc::channel::<CycleReport>(16);

        let engine = self.engine;
        let poll_interval = engine.config().poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let manual = tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Engine loop shutting down");
                        break;
                    }
                    request = override_rx.recv() => {
                        let Some(reason) = request else {
                            debug!("Override channel closed");
                            continue;
                        };
                        info!(reason = %reason, "Manual refresh requested");
                        true
                    }
                    _ = ticker.tick() => false,
                };

                if let Err(e) = engine.sync_kill_switch().await {
                    warn!(error = %e, "Kill switch sync failed");
                }

                match engine.poll(manual).await {
                    Ok(Some(_)) => {}
                    Ok(None) => continue,
                    Err(e) => warn!(error = %e, "Refresh failed, serving last valid configuration"),
                }

                let report = engine.run_cycle().await;
                if report_tx.send(report).await.is_err() {
                    debug!("Cycle report receiver dropped, stopping engine loop");
                    return;
                }
            }
        });

        (
            EngineHandle {
                shutdown_tx,
                override_tx,
            },
            report_rx,
        )
    }
}
