//! Task execution infrastructure.
//!
//! This module provides the executor facade, the worker threads behind
//! it, the group cancellation table, and the result registry.

pub mod pool;
pub mod task;

pub(crate) mod group;
pub(crate) mod registry;
pub(crate) mod worker;

pub use pool::Executor;
pub use task::{Priority, TaskId, TaskOutput};
