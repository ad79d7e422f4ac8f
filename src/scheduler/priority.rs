use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;

use crate::executor::task::{TaskId, TaskRecord};

/// Heap entry wrapping a record so the smallest priority value pops first.
///
/// Ordering compares priority only: among equal priorities the pop order
/// is whatever the heap produces, and callers must not rely on it.
#[derive(Debug)]
struct QueuedRecord(TaskRecord);

impl PartialEq for QueuedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority == other.0.priority
    }
}

impl Eq for QueuedRecord {}

impl PartialOrd for QueuedRecord {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedRecord {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap; reverse so High (0) beats Low (2).
        other.0.priority.cmp(&self.0.priority)
    }
}

/// Ordered holding area for pending task records.
///
/// Not synchronized: the executor owns it inside its monitor.
#[derive(Debug, Default)]
pub(crate) struct PriorityQueue {
    heap: BinaryHeap<QueuedRecord>,
}

impl PriorityQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub(crate) fn push(&mut self, record: TaskRecord) {
        self.heap.push(QueuedRecord(record));
    }

    /// Pop the highest-priority pending record.
    pub(crate) fn pop(&mut self) -> Option<TaskRecord> {
        self.heap.pop().map(|entry| entry.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Rebuild the heap without records of `group`, returning the ids of
    /// the records that were purged.
    pub(crate) fn purge_group(&mut self, group: usize) -> Vec<TaskId> {
        let mut purged = Vec::new();
        let mut kept = BinaryHeap::with_capacity(self.heap.len());

        for entry in self.heap.drain() {
            if entry.0.group == group {
                purged.push(entry.0.id);
            } else {
                kept.push(entry);
            }
        }

        self.heap = kept;
        purged
    }
}
