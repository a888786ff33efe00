//! Things that can be perceived, grouped by faction.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use hz_core::math::dist_sqr;
use hz_core::{EntityId, EntityLocator, Faction, SimRng, Vec3};

/// Perception-facing traits of one entity.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sensable {
    pub faction:     Faction,
    /// Aggro switches targets only for a strictly higher priority.
    pub priority:    f32,
    /// Eye/head point relative to the entity's position.  Sight rays start
    /// and end here.
    pub head_offset: Vec3,
}

impl Sensable {
    pub const DEFAULT_PRIORITY: f32 = 0.5;
    pub const DEFAULT_HEAD_OFFSET: Vec3 = Vec3::new(0.0, 0.3, 0.0);

    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            priority:    Self::DEFAULT_PRIORITY,
            head_offset: Self::DEFAULT_HEAD_OFFSET,
        }
    }

    pub fn with_priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_head_offset(mut self, head_offset: Vec3) -> Self {
        self.head_offset = head_offset;
        self
    }

    #[inline]
    pub fn is_enemy_of(&self, other: &Sensable) -> bool {
        self.faction.is_enemy_of(other.faction)
    }
}

// ── SensableRegistry ──────────────────────────────────────────────────────────

/// Every registered sensable, indexed by faction.
///
/// Faction membership iterates in id order so sensing outcomes do not depend
/// on registration order.
#[derive(Debug, Default)]
pub struct SensableRegistry {
    by_faction: BTreeMap<Faction, BTreeSet<EntityId>>,
    details:    FxHashMap<EntityId, Sensable>,
}

impl SensableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register with new traits) `entity`.
    pub fn register(&mut self, entity: EntityId, sensable: Sensable) {
        if let Some(old) = self.details.insert(entity, sensable) {
            if let Some(set) = self.by_faction.get_mut(&old.faction) {
                set.remove(&entity);
            }
        }
        self.by_faction.entry(sensable.faction).or_default().insert(entity);
    }

    pub fn unregister(&mut self, entity: EntityId) -> Option<Sensable> {
        let old = self.details.remove(&entity)?;
        if let Some(set) = self.by_faction.get_mut(&old.faction) {
            set.remove(&entity);
        }
        Some(old)
    }

    #[inline]
    pub fn get(&self, entity: EntityId) -> Option<&Sensable> {
        self.details.get(&entity)
    }

    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.details.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Members of `faction` in id order.
    pub fn members(&self, faction: Faction) -> impl Iterator<Item = EntityId> + '_ {
        self.by_faction.get(&faction).into_iter().flatten().copied()
    }

    pub fn count(&self, faction: Faction) -> usize {
        self.by_faction.get(&faction).map_or(0, BTreeSet::len)
    }

    /// Priority of `entity`, or negative infinity for an unknown entity so
    /// anything registered outranks it.
    pub fn priority(&self, entity: EntityId) -> f32 {
        self.get(entity).map_or(f32::NEG_INFINITY, |s| s.priority)
    }

    /// Member of `faction` nearest to `point`.  Ties keep the lower id.
    pub fn closest_with_faction(
        &self,
        faction:  Faction,
        point:    Vec3,
        entities: &dyn EntityLocator,
    ) -> Option<EntityId> {
        let mut best: Option<(EntityId, f32)> = None;
        for entity in self.members(faction) {
            let Some(pos) = entities.position(entity) else {
                continue;
            };
            let d2 = dist_sqr(pos, point);
            if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
                best = Some((entity, d2));
            }
        }
        best.map(|(entity, _)| entity)
    }

    /// Uniformly chosen member of `faction`.
    pub fn random_with_faction(&self, faction: Faction, rng: &mut SimRng) -> Option<EntityId> {
        let set = self.by_faction.get(&faction)?;
        let i = rng.index(set.len())?;
        set.iter().nth(i).copied()
    }

    pub fn clear(&mut self) {
        self.by_faction.clear();
        self.details.clear();
    }
}
