//! Turns positions into trigger enter/exit events.

use std::collections::{BTreeMap, BTreeSet};

use hz_core::{EntityId, PartitionId, Vec3};

use crate::PartitionGraph;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    Enter(PartitionId),
    Exit(PartitionId),
}

/// Remembers which trigger volumes each entity was inside last tick.
#[derive(Clone, Debug, Default)]
pub struct TriggerTracker {
    inside: BTreeMap<EntityId, BTreeSet<PartitionId>>,
}

impl TriggerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events for `entity` now at `position`.  Enters come before exits, so
    /// crossing a shared boundary never leaves a gap.
    pub fn update(&mut self, entity: EntityId, position: Vec3, graph: &PartitionGraph) -> Vec<TriggerEvent> {
        let now: BTreeSet<PartitionId> = graph.containing(position).collect();
        let before = self.inside.entry(entity).or_default();
        let mut events: Vec<TriggerEvent> =
            now.difference(before).map(|&p| TriggerEvent::Enter(p)).collect();
        events.extend(before.difference(&now).map(|&p| TriggerEvent::Exit(p)));
        *before = now;
        events
    }

    pub fn inside(&self, entity: EntityId) -> Option<&BTreeSet<PartitionId>> {
        self.inside.get(&entity)
    }

    pub fn remove(&mut self, entity: EntityId) {
        self.inside.remove(&entity);
    }

    pub fn clear(&mut self) {
        self.inside.clear();
    }
}
