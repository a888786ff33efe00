//! R-tree over live AI positions for neighbor queries.
//!
//! Rebuilt in bulk once per tick; bulk loading is cheaper than moving every
//! entry and the index is read-only for the rest of the tick.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use hz_core::{EntityId, Vec3};
use hz_steering::NeighborQuery;

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct AiEntry {
    point: [f32; 3],
    id:    EntityId,
}

impl RTreeObject for AiEntry {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for AiEntry {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

// ── ProximityIndex ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ProximityIndex {
    tree: RTree<AiEntry>,
}

impl ProximityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole index.
    pub fn rebuild(&mut self, positions: impl IntoIterator<Item = (EntityId, Vec3)>) {
        let entries: Vec<AiEntry> = positions
            .into_iter()
            .map(|(id, p)| AiEntry { point: p.to_array(), id })
            .collect();
        self.tree = RTree::bulk_load(entries);
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Entities within `radius` of `center`, sorted by id.
    pub fn within(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .tree
            .locate_within_distance(center.to_array(), radius * radius)
            .map(|e| e.id)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn nearest(&self, point: Vec3) -> Option<EntityId> {
        self.tree.nearest_neighbor(&point.to_array()).map(|e| e.id)
    }
}

impl NeighborQuery for ProximityIndex {
    fn neighbors_within(&self, center: Vec3, radius: f32, exclude: EntityId) -> Vec<EntityId> {
        let mut out = self.within(center, radius);
        out.retain(|&e| e != exclude);
        out
    }
}
