//! Read-only position lookups shared across subsystems.

use crate::{EntityId, Vec3};

/// Resolves an entity to its current pose.
///
/// Perception, the blackboard-driven behavior nodes, and the horde manager
/// all need "where is X right now" without owning the physics state.  The
/// simulation implements this over its body storage; tests implement it over
/// a plain map.
pub trait EntityLocator {
    /// World position, or `None` if the entity no longer exists.
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// Unit facing direction.  Defaults to `+Z` for entities with no notion
    /// of facing.
    fn forward(&self, entity: EntityId) -> Option<Vec3> {
        self.position(entity).map(|_| Vec3::Z)
    }
}

impl EntityLocator for std::collections::BTreeMap<EntityId, Vec3> {
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.get(&entity).copied()
    }
}
