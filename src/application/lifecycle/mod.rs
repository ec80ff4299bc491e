//! Strategy lifecycle state machine.

mod evaluator;

pub use evaluator::{Assessment, LifecycleEvaluator, LifecycleThresholds, Resolution};
