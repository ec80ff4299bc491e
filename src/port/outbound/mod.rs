//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the engine's collaborators: the performance
//! store, per-strategy domain logic, durable configuration storage,
//! notifications and time.

pub mod clock;
pub mod executor;
pub mod notifier;
pub mod performance;
pub mod store;
