//! Observability for the executor: counters and latency percentiles,
//! recorded by workers and exposed read-only on the facade.

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
