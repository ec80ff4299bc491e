//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!   CLI / service ──► inbound::StrategyControl ──► Engine
//!                                                   │
//!        ┌──────────────────┬───────────────┬───────┴──────┬──────────┐
//!        ▼                  ▼               ▼              ▼          ▼
//!  PerformanceSource  StrategyExecutor  ConfigurationStore Notifier  Clock
//! ```

pub mod inbound;
pub mod outbound;
