//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] - [`ManualClock`](clock::ManualClock), a settable time source.
//! - [`performance`] - Scripted [`PerformanceSource`](crate::port::outbound::performance::PerformanceSource).
//! - [`executor`] - Scripted [`StrategyExecutor`](crate::port::outbound::executor::StrategyExecutor).
//! - [`store`] - In-memory [`ConfigurationStore`](crate::port::outbound::store::ConfigurationStore)
//!   with write-failure injection.
//! - [`notifier`] - A notifier that records every event.
//! - [`domain`] - Builders for records, signals and a fully wired engine.

pub mod clock;
pub mod domain;
pub mod executor;
pub mod notifier;
pub mod performance;
pub mod store;
