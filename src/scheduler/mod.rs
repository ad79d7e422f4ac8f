//! Scheduling order for pending tasks.

pub(crate) mod priority;
