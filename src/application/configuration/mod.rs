//! Configuration derivation: data-backed builder and cold-start defaults.

mod bootstrap;
mod builder;

pub use bootstrap::{BootstrapPolicy, ColdStartBootstrapper};
pub use builder::{emission_cap, BuildInput, BuilderPolicy, ConfigurationBuilder};
