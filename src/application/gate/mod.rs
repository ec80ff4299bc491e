//! Validation gate with atomic per-day emission counters.

mod validator;

pub use validator::ValidationGate;
