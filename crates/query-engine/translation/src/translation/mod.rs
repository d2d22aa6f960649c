//! Translate a selection over the entity model into an ExecutionPlan to be run by a transport.

pub mod error;
pub mod helpers;
pub mod query;
pub mod request;
