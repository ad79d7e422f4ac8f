//! Group enablement table: a fixed-size atomic bit-set, one bit per
//! cancellation group.
//!
//! Lives outside the queue monitor so that disabling a group never
//! contends with workers holding the queue lock. Bits are cleared and set
//! with compare-and-swap retry loops; reads are plain atomic loads.

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;

#[derive(Debug)]
pub(crate) struct GroupTable {
    words: Vec<AtomicU64>,
    len: usize,
}

impl GroupTable {
    /// All groups start enabled.
    pub(crate) fn new(len: usize) -> Self {
        let n_words = len.div_ceil(WORD_BITS);
        let words = (0..n_words).map(|_| AtomicU64::new(u64::MAX)).collect();
        Self { words, len }
    }

    pub(crate) fn contains(&self, group: usize) -> bool {
        group < self.len
    }

    pub(crate) fn is_enabled(&self, group: usize) -> bool {
        debug_assert!(group < self.len);
        let word = self.words[group / WORD_BITS].load(Ordering::Acquire);
        word & (1u64 << (group % WORD_BITS)) != 0
    }

    pub(crate) fn disable(&self, group: usize) {
        self.update(group, |word, mask| word & !mask);
    }

    pub(crate) fn enable(&self, group: usize) {
        self.update(group, |word, mask| word | mask);
    }

    fn update(&self, group: usize, apply: impl Fn(u64, u64) -> u64) {
        debug_assert!(group < self.len);
        let word = &self.words[group / WORD_BITS];
        let mask = 1u64 << (group % WORD_BITS);
        let mut current = word.load(Ordering::Acquire);
        loop {
            let next = apply(current, mask);
            match word.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}
