//! SQLite persistence adapters.
//!
//! Provides the durable configuration store and the performance-record
//! reader using Diesel ORM.

pub mod database;
pub mod performance;
pub mod store;
