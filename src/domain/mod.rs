//! Domain types: performance records, lifecycle, configurations, signals.
//!
//! Pure data with no I/O; every other layer depends on these.

pub mod alert;
pub mod category;
pub mod configuration;
pub mod id;
pub mod lifecycle;
pub mod live;
pub mod performance;
pub mod signal;
pub mod strategy;
pub mod trigger;
