// ring.rs — DecisionRing: bounded FIFO of DecisionRecord (Module F).

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::record::DecisionRecord;

pub const DEFAULT_RING_SIZE: usize = 50;

/// A fixed-capacity FIFO guarded by a single lock. `append` evicts the
/// oldest entry on overflow so it never allocates beyond capacity.
pub struct DecisionRing {
    entries: Mutex<VecDeque<DecisionRecord>>,
    capacity: usize,
}

impl DecisionRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn append(&self, record: DecisionRecord) {
        let mut guard = self.entries.lock().unwrap();
        if guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(record);
    }

    /// Most-recent-first, capped at `limit` (and at the ring's own capacity).
    pub fn snapshot(&self, limit: usize) -> Vec<DecisionRecord> {
        let guard = self.entries.lock().unwrap();
        let limit = limit.min(guard.len());
        guard.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DecisionRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_SIZE)
    }
}
