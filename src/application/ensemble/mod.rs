//! Ensemble arbitration of candidate signals.

mod arbiter;

pub use arbiter::{EnsembleArbiter, WeightedSignal};
