//! Resolve selection requests over an entity model by compiling them into query plans.

pub mod connector;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod state;
