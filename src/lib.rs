//! Stratagem - adaptive lifecycle and ensemble arbitration for competing
//! signal strategies.
//!
//! The engine reads each strategy's historical performance, moves it through
//! a lifecycle (ACTIVE, PROBATION, CIRCUIT_BREAKER_OPEN, QUARANTINE,
//! DEPRECATED), derives a versioned configuration per strategy, gates every
//! call against that configuration, and merges the signals of concurrently
//! executed strategies into one decision per entity and market.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Pure data: performance records, lifecycle statuses,
//!   configurations, signals, alerts.
//! - [`port`] - Traits at the seams: the inbound control surface and the
//!   outbound performance source, executor, store, notifier and clock.
//! - [`application`] - The evaluator, configuration builder, cold-start
//!   bootstrapper, trigger controller, validation gate, ensemble arbiter and
//!   the [`Engine`](application::engine::Engine) that drives them.
//! - [`adapter`] - SQLite store and performance source, signal-file
//!   executor, and the `stratagem` CLI.
//! - [`infrastructure`] - TOML configuration, logging setup and the
//!   composition root.
//!
//! # Example
//!
//! ```no_run
//! use stratagem::infrastructure::bootstrap;
//! use stratagem::infrastructure::config::settings::Config;
//! use stratagem::port::inbound::control::StrategyControl;
//!
//! # async fn demo() -> stratagem::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let engine = bootstrap::build_engine(&config)?;
//! engine.initialize().await?;
//! let live = engine.get_live_configuration(false).await?;
//! println!("serving {}", live.version());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
