//! CLI module graph.

pub mod alerts;
pub mod check;
pub mod command;
pub mod control;
pub mod history;
pub mod output;
pub mod paths;
pub mod run;
pub mod status;
