//! Outbound adapters (driven side).

pub mod executor;
pub mod sqlite;
