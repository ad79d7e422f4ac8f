//! Result registry: one slot per issued task id, fulfilled exactly once
//! and consumed at most once.
//!
//! The registry itself is not synchronized; it lives inside the executor's
//! monitor and is only touched with the queue lock held.

use std::collections::HashMap;

use super::task::{TaskId, TaskOutput};

/// Lifecycle of a task's result.
pub(crate) enum ResultSlot {
    /// Still queued or running.
    Pending,
    /// Body returned a value.
    Ready(TaskOutput),
    /// Body panicked; the captured message.
    Faulted(String),
    /// Discarded by group disablement before it ran.
    Dropped,
}

impl std::fmt::Debug for ResultSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSlot::Pending => f.write_str("Pending"),
            ResultSlot::Ready(_) => f.write_str("Ready(..)"),
            ResultSlot::Faulted(msg) => write!(f, "Faulted({:?})", msg),
            ResultSlot::Dropped => f.write_str("Dropped"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResultRegistry {
    slots: HashMap<TaskId, ResultSlot>,
}

impl ResultRegistry {
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    pub(crate) fn insert_pending(&mut self, id: TaskId) {
        let previous = self.slots.insert(id, ResultSlot::Pending);
        debug_assert!(previous.is_none(), "task id reused: {}", id);
    }

    pub(crate) fn fulfill(&mut self, id: TaskId, value: TaskOutput) {
        self.transition(id, ResultSlot::Ready(value));
    }

    pub(crate) fn fault(&mut self, id: TaskId, message: String) {
        self.transition(id, ResultSlot::Faulted(message));
    }

    pub(crate) fn drop_slot(&mut self, id: TaskId) {
        self.transition(id, ResultSlot::Dropped);
    }

    fn transition(&mut self, id: TaskId, terminal: ResultSlot) {
        if let Some(slot) = self.slots.get_mut(&id) {
            debug_assert!(
                matches!(slot, ResultSlot::Pending),
                "slot {} fulfilled twice",
                id
            );
            *slot = terminal;
        }
    }

    /// Whether `id` has a slot at all (issued and not yet consumed).
    pub(crate) fn knows(&self, id: TaskId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Whether `id` has left `Pending`.
    pub(crate) fn is_settled(&self, id: TaskId) -> bool {
        matches!(
            self.slots.get(&id),
            Some(ResultSlot::Ready(_) | ResultSlot::Faulted(_) | ResultSlot::Dropped)
        )
    }

    /// Remove and return a settled slot. `None` when the id is unknown,
    /// already consumed, or still pending.
    pub(crate) fn claim(&mut self, id: TaskId) -> Option<ResultSlot> {
        if self.is_settled(id) {
            self.slots.remove(&id)
        } else {
            None
        }
    }

    /// Atomically empty the registry, keeping only values that reached
    /// `Ready`. Faulted and Dropped slots are discarded with the drain.
    pub(crate) fn drain_ready(&mut self) -> HashMap<TaskId, TaskOutput> {
        self.slots
            .drain()
            .filter_map(|(id, slot)| match slot {
                ResultSlot::Ready(value) => Some((id, value)),
                _ => None,
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_consumes_once() {
        let mut registry = ResultRegistry::new();
        let id = TaskId::next();
        registry.insert_pending(id);

        assert!(registry.claim(id).is_none(), "pending slot not claimable");

        registry.fulfill(id, Box::new(5u8));
        let slot = registry.claim(id).unwrap();
        assert!(matches!(slot, ResultSlot::Ready(_)));

        assert!(registry.claim(id).is_none(), "slot consumed twice");
        assert!(!registry.knows(id));
    }

    #[test]
    fn test_drain_keeps_ready_only() {
        let mut registry = ResultRegistry::new();
        let ok = TaskId::next();
        let bad = TaskId::next();
        let gone = TaskId::next();

        registry.insert_pending(ok);
        registry.insert_pending(bad);
        registry.insert_pending(gone);

        registry.fulfill(ok, Box::new(1i32));
        registry.fault(bad, "oops".into());
        registry.drop_slot(gone);

        let drained = registry.drain_ready();
        assert_eq!(drained.len(), 1);
        assert!(drained.contains_key(&ok));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_dropped_slot_is_settled() {
        let mut registry = ResultRegistry::new();
        let id = TaskId::next();
        registry.insert_pending(id);
        assert!(!registry.is_settled(id));

        registry.drop_slot(id);
        assert!(registry.is_settled(id));
        assert!(matches!(registry.claim(id), Some(ResultSlot::Dropped)));
    }
}
