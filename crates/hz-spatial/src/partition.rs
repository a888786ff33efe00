//! Static level regions and the spawn points they own.

use std::collections::BTreeSet;

use hz_core::{EntityId, PartitionId, SpawnerId};

use crate::Aabb;

/// One region of the level.
///
/// `active_ai` holds the zombies this partition currently owns; population
/// is measured against it, not against queued spawn requests.
#[derive(Clone, Debug)]
pub struct Partition {
    pub id:             PartitionId,
    pub name:           String,
    /// Trigger volume.
    pub bounds:         Aabb,
    pub neighbors:      Vec<PartitionId>,
    /// Gated partitions are never populated through a neighbor.
    pub gated:          bool,
    pub target_walkers: u32,
    pub spawners:       Vec<SpawnerId>,
    pub active_ai:      BTreeSet<EntityId>,
    /// Walkers killed here outside of a horde.
    pub walkers_killed: u32,
}

impl Partition {
    pub(crate) fn new(id: PartitionId, name: String, bounds: Aabb, target_walkers: u32) -> Self {
        Self {
            id,
            name,
            bounds,
            neighbors: Vec::new(),
            gated: false,
            target_walkers,
            spawners: Vec::new(),
            active_ai: BTreeSet::new(),
            walkers_killed: 0,
        }
    }

    /// How many walkers are missing from the target.
    #[inline]
    pub fn deficit(&self) -> u32 {
        self.target_walkers.saturating_sub(self.active_ai.len() as u32)
    }
}

/// A spawn volume owned by one partition.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spawner {
    pub id:        SpawnerId,
    pub partition: PartitionId,
    pub bounds:    Aabb,
}
