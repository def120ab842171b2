//! Execution-graph reconstruction for a workflow-orchestration console.
//!
//! Flat API responses (an execution record, its task list and the inputs
//! of every fork task) are reconciled with the static workflow definition
//! into a single [`runtime::graph::Graph`].

#[macro_use]
mod macros;

pub mod client;
pub mod compiler;
pub mod config;
pub mod dsl;
pub mod error;
pub mod runtime;

pub use error::{Error, Result};
