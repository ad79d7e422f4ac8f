//! Worker thread loop.
//!
//! Workers block on the pool monitor until work arrives, retirement is
//! requested by `resize`, or shutdown is signalled. A shutdown worker
//! drains the queue before exiting; a retiring worker leaves at once and
//! pending tasks stay behind for the survivors.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::MutexGuard;

use super::pool::{Inner, Shared};
use super::task::{panic_message, TaskRecord};
use crate::telemetry::Metrics;

pub(crate) fn run(shared: Arc<Shared>, metrics: Arc<Metrics>) {
    loop {
        let record = {
            let mut inner = shared.inner.lock();
            loop {
                if inner.retiring > 0 {
                    inner.retiring -= 1;
                    return exit(&shared, inner);
                }
                if inner.shutdown && inner.queue.is_empty() {
                    return exit(&shared, inner);
                }
                if let Some(record) = inner.queue.pop() {
                    inner.busy_workers += 1;
                    break record;
                }
                shared.work_available.wait(&mut inner);
            }
        };

        // The group bit is read without the monitor; a task dequeued while
        // its group is disabled is discarded without running.
        if !shared.groups.is_enabled(record.group) {
            metrics.record_task_dropped();
            let mut inner = shared.inner.lock();
            inner.registry.drop_slot(record.id);
            inner.busy_workers -= 1;
            shared.result_settled.notify_all();
            notify_if_quiescent(&shared, &inner);
            continue;
        }

        let TaskRecord { id, body, .. } = record;
        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(body));
        let elapsed_ns = start.elapsed().as_nanos() as u64;

        let mut inner = shared.inner.lock();
        match outcome {
            Ok(value) => {
                metrics.record_task_execution(elapsed_ns);
                inner.registry.fulfill(id, value);
            }
            Err(payload) => {
                // Fault domain ends here: record it and keep serving.
                let message = panic_message(payload);
                eprintln!("task {} panicked: {}", id, message);
                metrics.record_task_panic();
                inner.registry.fault(id, message);
            }
        }
        inner.busy_workers -= 1;
        shared.result_settled.notify_all();
        notify_if_quiescent(&shared, &inner);
    }
}

fn exit(shared: &Shared, mut inner: MutexGuard<'_, Inner>) {
    inner.live_workers -= 1;
    shared.lifecycle.notify_all();
}

fn notify_if_quiescent(shared: &Shared, inner: &Inner) {
    if inner.busy_workers == 0 && inner.queue.is_empty() {
        shared.lifecycle.notify_all();
    }
}
