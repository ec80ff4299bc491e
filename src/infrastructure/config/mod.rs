//! Infrastructure configuration modules.

pub mod engine;
pub mod lifecycle;
pub mod logging;
pub mod settings;
pub mod strategy;
