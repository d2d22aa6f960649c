//! The relational query plan: its AST, helpers for building it and its textual rendering.

pub mod ast;
pub mod convert;
pub mod execution_plan;
pub mod helpers;
pub mod string;
