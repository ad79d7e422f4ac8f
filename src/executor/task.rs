//! Task representation: identifier, priority, and the type-erased record
//! that flows through the queue.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted task.
///
/// Ids are strictly increasing for the lifetime of the process and are
/// never reused, even across executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scheduling priority. Lower value runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    High = 0,
    Normal = 1,
    Low = 2,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// The result of a task body, erased so the registry can hold
/// heterogeneous return types behind one slot type.
pub type TaskOutput = Box<dyn Any + Send>;

pub(crate) type BoxedBody = Box<dyn FnOnce() -> TaskOutput + Send + 'static>;

/// A unit of deferred work plus its scheduling metadata. Owned by the
/// queue until dequeued, then exclusively by the executing worker.
pub(crate) struct TaskRecord {
    pub(crate) id: TaskId,
    pub(crate) body: BoxedBody,
    pub(crate) priority: Priority,
    pub(crate) group: usize,
}

impl TaskRecord {
    pub(crate) fn new<F, R>(body: F, priority: Priority, group: usize) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        TaskRecord {
            id: TaskId::next(),
            body: Box::new(move || Box::new(body()) as TaskOutput),
            priority,
            group,
        }
    }
}

impl std::fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("group", &self.group)
            .finish()
    }
}

/// Extract a printable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increasing() {
        let a = TaskId::next();
        let b = TaskId::next();
        let c = TaskId::next();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Low);
    }

    #[test]
    fn test_erased_body_output() {
        let record = TaskRecord::new(|| 21 * 2, Priority::Normal, 0);
        let out = (record.body)();
        assert_eq!(*out.downcast::<i32>().unwrap(), 42);
    }

    #[test]
    fn test_panic_message_str() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaput"));
        assert_eq!(panic_message(payload), "kaput");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7usize);
        assert_eq!(panic_message(payload), "unknown panic");
    }
}
