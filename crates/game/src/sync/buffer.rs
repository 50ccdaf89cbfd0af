use std::collections::VecDeque;

use crate::state::GameState;

/// Bounded ring of the most recent authoritative snapshots, oldest
/// evicted first. Kept for divergence diagnostics and future latency
/// compensation; reconciliation itself always works off the newest.
#[derive(Debug)]
pub struct SnapshotRing {
    snapshots: VecDeque<GameState>,
    capacity: usize,
}

impl SnapshotRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: GameState) {
        if self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<&GameState> {
        self.snapshots.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameState> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
