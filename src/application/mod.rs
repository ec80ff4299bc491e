//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the engine's use cases.

pub mod configuration;
pub mod engine;
pub mod ensemble;
pub mod gate;
pub mod lifecycle;
pub mod registry;
pub mod state;
pub mod trigger;
