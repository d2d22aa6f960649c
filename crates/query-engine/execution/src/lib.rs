//! Execution of query plans against an entity store, and the instances they return.

pub mod error;
pub mod evaluation;
pub mod instance;
pub mod metrics;
pub mod query;
pub mod store;
