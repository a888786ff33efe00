//! Services the controller consumes but does not implement: collision
//! queries, navigation paths, and neighbor lookups.
//!
//! All of them are synchronous and answer within the tick they are asked.

use hz_core::math::dist_sqr;
use hz_core::{EntityId, Vec3};

/// Result of a successful raycast.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    pub point:    Vec3,
    pub normal:   Vec3,
    pub distance: f32,
    /// The entity whose collider was hit, if it was an entity at all.
    pub entity:   Option<EntityId>,
}

/// Physics raycasting.
pub trait CollisionQuery {
    /// Nearest hit along `dir` within `max_dist`, ignoring `ignore`'s own
    /// collider.
    fn raycast(
        &self,
        origin:   Vec3,
        dir:      Vec3,
        max_dist: f32,
        ignore:   Option<EntityId>,
    ) -> Option<RayHit>;

    /// Downward probe used for grounding.  Engines typically sweep a sphere
    /// of `radius`; the default falls back to a ray, which is adequate for
    /// flat or gently sloped ground.
    fn ground_probe(&self, origin: Vec3, _radius: f32, max_dist: f32) -> Option<RayHit> {
        self.raycast(origin, Vec3::NEG_Y, max_dist, None)
    }
}

/// A jump connection between two disconnected pieces of walkable surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OffMeshLink {
    pub start: Vec3,
    pub end:   Vec3,
}

/// A computed path: ground-level corners plus any off-mesh links along it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavPath {
    pub corners: Vec<Vec3>,
    pub links:   Vec<OffMeshLink>,
}

impl NavPath {
    /// Corner tolerance for matching a link start to a path corner.
    pub const LINK_MATCH_DIST_SQR: f32 = 0.1;

    pub fn straight(from: Vec3, to: Vec3) -> Self {
        Self { corners: vec![from, to], links: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// The off-mesh link that begins at `corner`, if any.
    pub fn link_at(&self, corner: Vec3) -> Option<&OffMeshLink> {
        self.links
            .iter()
            .find(|link| dist_sqr(link.start, corner) < Self::LINK_MATCH_DIST_SQR)
    }
}

/// Black-box navigation mesh.
pub trait PathProvider {
    /// Path from `from` to `to`, or `None` when the destination is
    /// unreachable.
    fn calculate_path(&self, from: Vec3, to: Vec3) -> Option<NavPath>;

    /// Closest walkable point within `max_dist` of `near`.
    fn sample_position(&self, near: Vec3, max_dist: f32) -> Option<Vec3>;
}

/// Spatial lookup of nearby AI bodies for separation.
pub trait NeighborQuery {
    /// Entities within `radius` of `center`, excluding `exclude`.
    fn neighbors_within(&self, center: Vec3, radius: f32, exclude: EntityId) -> Vec<EntityId>;
}

/// A physical contact reported by the world after integration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObstacleContact {
    /// First contact point.
    pub point:       Vec3,
    /// Center of the other collider.
    pub center:      Vec3,
    /// Top of the other collider's bounds.
    pub top_y:       f32,
    /// Whether the obstacle is tagged as something agents may clamber over.
    pub traversable: bool,
}
