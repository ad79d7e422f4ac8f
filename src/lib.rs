//! TRIAGE - multi-priority task executor with group cancellation
//!
//! An in-process thread pool for device-control workloads: callers submit
//! background work without blocking, and batches of related tasks can be
//! cancelled together by group.
//!
//! # Quick Start
//!
//! ```
//! use triage::{Config, Executor, Priority};
//!
//! let pool = Executor::new(Config::default())?;
//!
//! // Fire off some work tagged with priorities and groups.
//! let calibrate = pool.submit(|| 42u32, Priority::High, 0)?;
//! let sweep = pool.submit(|| "sweep done", Priority::Low, 1)?;
//!
//! assert_eq!(pool.join_as::<u32>(calibrate)?, 42);
//! assert_eq!(pool.join_as::<&str>(sweep)?, "sweep done");
//!
//! pool.shutdown();
//! # Ok::<(), triage::Error>(())
//! ```
//!
//! # Features
//!
//! - **Priority scheduling**: `High` runs before `Normal` before `Low`;
//!   order within one priority class is unspecified
//! - **Group cancellation**: disable a group to drop every queued task
//!   tagged with it, without touching running tasks
//! - **Elastic workers**: threads are spawned lazily with demand, up to a
//!   resizable cap
//! - **Fault isolation**: a panicking task is reported to its joiner and
//!   never takes a worker down
//! - **Telemetry**: task counters and latency percentiles

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Executor, Priority, TaskId, TaskOutput};
pub use telemetry::{Metrics, MetricsSnapshot};
