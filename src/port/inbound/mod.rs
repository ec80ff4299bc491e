//! Inbound (driving) ports consumed by the CLI and the background service.
//!
//! - [`control`]: Operator and caller-facing engine capabilities
//! - [`gate`]: Result types for the per-call validation gate

pub mod control;
pub mod gate;
