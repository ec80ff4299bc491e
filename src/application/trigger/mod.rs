//! Refresh triggering: priority, debounce, staleness and degradation.

mod controller;
mod degradation;

pub use controller::{TriggerInputs, TriggerPolicy, UpdateTriggerController};
pub use degradation::{Degradation, DegradationDetector};
