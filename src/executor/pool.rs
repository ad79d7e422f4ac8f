//! The executor facade and its synchronization core.
//!
//! One monitor (the `inner` mutex plus its condvars) guards the pending
//! queue, the result registry, and the worker counters. The group table
//! lives outside it and is mutated with lock-free compare-and-swap.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use super::group::GroupTable;
use super::registry::{ResultRegistry, ResultSlot};
use super::task::{Priority, TaskId, TaskOutput, TaskRecord};
use super::worker;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::priority::PriorityQueue;
use crate::telemetry::{Metrics, MetricsSnapshot};

/// Monitor-protected executor state.
pub(crate) struct Inner {
    pub(crate) queue: PriorityQueue,
    pub(crate) registry: ResultRegistry,
    pub(crate) live_workers: usize,
    pub(crate) busy_workers: usize,
    pub(crate) max_workers: usize,
    /// Workers asked to exit by `resize`; each retiring worker consumes one.
    pub(crate) retiring: usize,
    /// Monotonic suffix for worker thread names; never reused.
    pub(crate) next_worker_id: usize,
    pub(crate) shutdown: bool,
}

pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    /// Workers wait here for queue activity, retirement, or shutdown.
    pub(crate) work_available: Condvar,
    /// `join` waiters; notified whenever any slot leaves `Pending`.
    pub(crate) result_settled: Condvar,
    /// Quiescence and worker-exit events: `join_all` and `resize` wait here.
    pub(crate) lifecycle: Condvar,
    pub(crate) groups: GroupTable,
}

/// In-process multi-priority task executor with group cancellation.
///
/// Worker threads are spawned lazily, one per `submit`, up to the
/// configured cap. Tasks carry a [`Priority`] and a cancellation group;
/// disabling a group drops every still-queued task tagged with it.
///
/// # Example
///
/// ```
/// use triage::{Config, Executor, Priority};
///
/// let pool = Executor::new(Config::builder().max_workers(2).build()?)?;
/// let id = pool.submit(|| 6 * 7, Priority::Normal, 0)?;
/// assert_eq!(pool.join_as::<i32>(id)?, 42);
/// # Ok::<(), triage::Error>(())
/// ```
pub struct Executor {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    metrics: Arc<Metrics>,
    config: Config,
}

impl Executor {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                queue: PriorityQueue::new(),
                registry: ResultRegistry::new(),
                live_workers: 0,
                busy_workers: 0,
                max_workers: config.worker_cap(),
                retiring: 0,
                next_worker_id: 0,
                shutdown: false,
            }),
            work_available: Condvar::new(),
            result_settled: Condvar::new(),
            lifecycle: Condvar::new(),
            groups: GroupTable::new(config.max_groups),
        });

        Ok(Self {
            shared,
            handles: Mutex::new(Vec::new()),
            metrics: Arc::new(Metrics::new()),
            config,
        })
    }

    /// Submit a task body for deferred execution.
    ///
    /// Returns the task's id on admission; the id is strictly greater than
    /// every id issued before it. Fails with [`Error::InvalidGroup`] when
    /// `group` is out of range, leaving no state behind.
    ///
    /// Submitting after [`shutdown`](Self::shutdown) is a caller error:
    /// the task is still enqueued but no worker will ever run it.
    pub fn submit<F, R>(&self, body: F, priority: Priority, group: usize) -> Result<TaskId>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.shared.groups.contains(group) {
            return Err(Error::InvalidGroup(group));
        }

        let record = TaskRecord::new(body, priority, group);
        let id = record.id;

        let mut inner = self.shared.inner.lock();
        inner.registry.insert_pending(id);
        inner.queue.push(record);
        self.shared.work_available.notify_one();

        if inner.live_workers < inner.max_workers && !inner.shutdown {
            self.spawn_worker(&mut inner)?;
        }

        Ok(id)
    }

    /// Submit with `Normal` priority into group 0.
    pub fn spawn<F, R>(&self, body: F) -> Result<TaskId>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit(body, Priority::Normal, 0)
    }

    /// Block until the task settles and claim its result.
    ///
    /// Fails with [`Error::UnknownTask`] if the id was never issued or was
    /// already consumed (by an earlier `join` or a `join_all` drain), with
    /// [`Error::TaskPanicked`] if the body panicked, and with
    /// [`Error::Cancelled`] if the task's group was disabled before it ran.
    pub fn join(&self, id: TaskId) -> Result<TaskOutput> {
        let mut inner = self.shared.inner.lock();
        loop {
            if !inner.registry.knows(id) {
                return Err(Error::UnknownTask(id));
            }
            if let Some(slot) = inner.registry.claim(id) {
                return match slot {
                    ResultSlot::Ready(value) => Ok(value),
                    ResultSlot::Faulted(message) => Err(Error::TaskPanicked(message)),
                    ResultSlot::Dropped => Err(Error::Cancelled),
                    ResultSlot::Pending => unreachable!("claim never yields a pending slot"),
                };
            }
            self.shared.result_settled.wait(&mut inner);
        }
    }

    /// [`join`](Self::join), downcast to the body's concrete return type.
    pub fn join_as<T: 'static>(&self, id: TaskId) -> Result<T> {
        let value = self.join(id)?;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Error::TypeMismatch(id))
    }

    /// Block until quiescence (no task queued, no worker busy), then drain
    /// the registry, returning every result that reached `Ready`.
    ///
    /// Faulted and cancelled slots are discarded by the drain; a later
    /// `join` on their ids reports [`Error::UnknownTask`].
    pub fn join_all(&self) -> HashMap<TaskId, TaskOutput> {
        let mut inner = self.shared.inner.lock();
        while inner.busy_workers > 0 || !inner.queue.is_empty() {
            self.shared.lifecycle.wait(&mut inner);
        }
        inner.registry.drain_ready()
    }

    /// Disable a cancellation group.
    ///
    /// Every still-queued task of the group is dropped (its joiners wake
    /// with [`Error::Cancelled`]); running tasks finish undisturbed. Later
    /// submits to the group are admitted but discarded at dequeue time for
    /// as long as the group stays disabled.
    pub fn disable_group(&self, group: usize) -> Result<()> {
        if !self.shared.groups.contains(group) {
            return Err(Error::InvalidGroup(group));
        }
        self.shared.groups.disable(group);

        let mut inner = self.shared.inner.lock();
        let purged = inner.queue.purge_group(group);
        if !purged.is_empty() {
            for id in purged {
                inner.registry.drop_slot(id);
                self.metrics.record_task_dropped();
            }
            self.shared.result_settled.notify_all();
            if inner.busy_workers == 0 && inner.queue.is_empty() {
                self.shared.lifecycle.notify_all();
            }
        }
        Ok(())
    }

    /// Re-enable a disabled group. Tasks still queued under it become
    /// runnable again.
    pub fn enable_group(&self, group: usize) -> Result<()> {
        if !self.shared.groups.contains(group) {
            return Err(Error::InvalidGroup(group));
        }
        self.shared.groups.enable(group);
        Ok(())
    }

    /// Change the worker cap.
    ///
    /// Shrinking below the live count retires exactly the excess workers
    /// (each finishes its current task first) and blocks until the live
    /// count reaches `n`; queued tasks keep draining on the survivors.
    /// Growing the cap spawns workers immediately when tasks are pending.
    pub fn resize(&self, n: usize) -> Result<()> {
        {
            let mut inner = self.shared.inner.lock();
            inner.max_workers = n;

            if inner.live_workers > n {
                // Reconcile instead of accumulating: a concurrent shrink may
                // already hold credits, and overlapping shrinks must never
                // retire below the smallest target.
                let deficit = inner.live_workers - n;
                if inner.retiring < deficit {
                    inner.retiring = deficit;
                }
                self.shared.work_available.notify_all();
                while inner.live_workers > n {
                    self.shared.lifecycle.wait(&mut inner);
                }
            } else if !inner.shutdown {
                let target = n.min(inner.live_workers + inner.queue.len());
                while inner.live_workers < target {
                    self.spawn_worker(&mut inner)?;
                }
            }
        }
        self.reap_finished();
        Ok(())
    }

    /// Stop the pool: signal shutdown, wake every worker, and join them.
    ///
    /// Workers drain the queue before exiting. Idempotent; also invoked by
    /// `Drop`.
    pub fn shutdown(&self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.shutdown = true;
        }
        self.shared.work_available.notify_all();

        let handles: Vec<_> = {
            let mut handles = self.handles.lock();
            handles.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
    }

    pub fn live_workers(&self) -> usize {
        self.shared.inner.lock().live_workers
    }

    pub fn busy_workers(&self) -> usize {
        self.shared.inner.lock().busy_workers
    }

    pub fn pending_count(&self) -> usize {
        self.shared.inner.lock().queue.len()
    }

    pub fn max_workers(&self) -> usize {
        self.shared.inner.lock().max_workers
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Join the handles of workers that have already exited, so retired
    /// workers do not accumulate across resize cycles.
    fn reap_finished(&self) {
        let finished: Vec<JoinHandle<()>> = {
            let mut handles = self.handles.lock();
            let (finished, alive): (Vec<_>, Vec<_>) =
                handles.drain(..).partition(|handle| handle.is_finished());
            *handles = alive;
            finished
        };
        for handle in finished {
            let _ = handle.join();
        }
    }

    /// Spawn one worker. Caller holds the monitor and has checked the cap.
    fn spawn_worker(&self, inner: &mut Inner) -> Result<()> {
        let worker_id = inner.next_worker_id;
        inner.next_worker_id += 1;
        let name = format!("{}-{}", self.config.thread_name_prefix, worker_id);
        let mut builder = thread::Builder::new().name(name);
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let shared = Arc::clone(&self.shared);
        let metrics = Arc::clone(&self.metrics);
        let handle = builder
            .spawn(move || worker::run(shared, metrics))
            .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

        inner.live_workers += 1;
        self.handles.lock().push(handle);
        Ok(())
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("Executor")
            .field("live_workers", &inner.live_workers)
            .field("busy_workers", &inner.busy_workers)
            .field("max_workers", &inner.max_workers)
            .field("pending", &inner.queue.len())
            .field("shutdown", &inner.shutdown)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_join() {
        let pool = Executor::new(Config::default()).unwrap();
        let id = pool.spawn(|| 2 + 2).unwrap();
        assert_eq!(pool.join_as::<i32>(id).unwrap(), 4);
        pool.shutdown();
    }

    #[test]
    fn test_invalid_group_rejected() {
        let pool = Executor::new(Config::builder().max_groups(4).build().unwrap()).unwrap();
        let result = pool.submit(|| (), Priority::Normal, 4);
        assert!(matches!(result, Err(Error::InvalidGroup(4))));
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn test_join_unknown_task() {
        let pool = Executor::new(Config::default()).unwrap();
        let id = pool.spawn(|| ()).unwrap();
        pool.join(id).unwrap();
        assert!(matches!(pool.join(id), Err(Error::UnknownTask(_))));
    }

    #[test]
    fn test_join_as_type_mismatch() {
        let pool = Executor::new(Config::default()).unwrap();
        let id = pool.spawn(|| "text").unwrap();
        assert!(matches!(
            pool.join_as::<i64>(id),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_shutdown_idempotent() {
        let pool = Executor::new(Config::default()).unwrap();
        pool.spawn(|| ()).unwrap();
        pool.shutdown();
        pool.shutdown();
        assert_eq!(pool.live_workers(), 0);
    }

    #[test]
    fn test_resize_reaps_retired_worker_handles() {
        let pool = Executor::new(Config::builder().max_workers(4).build().unwrap()).unwrap();

        for _ in 0..10 {
            for i in 0..8 {
                pool.spawn(move || i).unwrap();
            }
            pool.join_all();
            pool.resize(0).unwrap();
            pool.resize(4).unwrap();
        }

        // Give the last retired threads a moment to finish, then reap once
        // more; the handles vec must not hold the 40 dead workers.
        std::thread::sleep(std::time::Duration::from_millis(50));
        pool.resize(4).unwrap();
        assert!(
            pool.handles.lock().len() <= 4,
            "retained {} join handles for dead threads",
            pool.handles.lock().len()
        );

        pool.shutdown();
    }

    #[test]
    fn test_respawned_worker_gets_fresh_name() {
        let pool = Executor::new(Config::builder().max_workers(1).build().unwrap()).unwrap();
        let worker_name = |pool: &Executor| {
            let id = pool
                .spawn(|| std::thread::current().name().unwrap().to_string())
                .unwrap();
            pool.join_as::<String>(id).unwrap()
        };

        let first = worker_name(&pool);
        pool.resize(0).unwrap();
        pool.resize(1).unwrap();
        let second = worker_name(&pool);

        assert_ne!(first, second);
        pool.shutdown();
    }

    #[test]
    fn test_lazy_spawn_capped() {
        let pool = Executor::new(Config::builder().max_workers(2).build().unwrap()).unwrap();
        assert_eq!(pool.live_workers(), 0);

        for _ in 0..8 {
            pool.spawn(|| std::thread::sleep(std::time::Duration::from_millis(5)))
                .unwrap();
        }
        assert!(pool.live_workers() <= 2);

        pool.join_all();
        pool.shutdown();
    }
}
