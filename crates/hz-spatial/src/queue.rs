//! The shared FIFO of pending spawns.

use std::collections::VecDeque;

use hz_core::{SpawnerId, ZombieType};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub spawner:     SpawnerId,
    pub zombie_type: ZombieType,
}

impl SpawnRequest {
    pub fn normal(spawner: SpawnerId) -> Self {
        Self { spawner, zombie_type: ZombieType::Normal }
    }
}

/// Requests are served strictly in arrival order, one per tick.
#[derive(Clone, Debug, Default)]
pub struct SpawnQueue {
    pending: VecDeque<SpawnRequest>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: SpawnRequest) {
        self.pending.push_back(request);
    }

    pub fn extend(&mut self, requests: impl IntoIterator<Item = SpawnRequest>) {
        self.pending.extend(requests);
    }

    pub fn pop(&mut self) -> Option<SpawnRequest> {
        self.pending.pop_front()
    }

    pub fn peek(&self) -> Option<&SpawnRequest> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnRequest> {
        self.pending.iter()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
