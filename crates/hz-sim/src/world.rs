//! The stand-in level: a flat floor, box obstacles, and the bodies moving
//! over them.
//!
//! [`FlatWorld`] answers collision and navigation queries against static
//! geometry only.  [`Scene`] layers this tick's body poses on top so sight
//! rays stop at the first entity they touch.  Entity colliders are bounding
//! spheres around each body's center.

use std::collections::BTreeMap;

use hz_core::math::horizontal_dist_sqr;
use hz_core::{EntityId, EntityLocator, Vec3};
use hz_spatial::Aabb;
use hz_steering::{CollisionQuery, NavPath, ObstacleContact, PathProvider, RayHit};

/// A body more than this far below the floor has fallen through it for good.
pub const FALL_THROUGH: f32 = 1.0;

/// Obstacles whose top is within this of a body's feet are stepped onto
/// rather than collided with.
pub const STEP_HEIGHT: f32 = 0.35;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub bounds:      Aabb,
    /// Agents may climb over it.
    pub traversable: bool,
}

// ── FlatWorld ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct FlatWorld {
    pub ground_y:  f32,
    /// Walkable footprints.  Only their x/z extents matter.
    pub floor:     Vec<Aabb>,
    pub obstacles: Vec<Obstacle>,
}

impl FlatWorld {
    pub fn new(ground_y: f32) -> Self {
        Self { ground_y, floor: Vec::new(), obstacles: Vec::new() }
    }

    pub fn with_floor(mut self, area: Aabb) -> Self {
        self.floor.push(area);
        self
    }

    pub fn with_obstacle(mut self, bounds: Aabb, traversable: bool) -> Self {
        self.obstacles.push(Obstacle { bounds, traversable });
        self
    }

    pub fn on_floor(&self, p: Vec3) -> bool {
        self.floor.iter().any(|area| covers_xz(area, p))
    }

    /// Highest surface under `p` that a body with its feet at `p` can stand
    /// on, or `None` over a hole.
    pub fn support_height(&self, p: Vec3) -> Option<f32> {
        let mut best = (self.on_floor(p) && p.y >= self.ground_y - FALL_THROUGH).then_some(self.ground_y);
        for obstacle in &self.obstacles {
            let top = obstacle.bounds.max.y;
            if covers_xz(&obstacle.bounds, p) && p.y >= top - STEP_HEIGHT {
                best = Some(best.map_or(top, |b| b.max(top)));
            }
        }
        best
    }

    /// Push a body standing at `feet` out of every obstacle it overlaps.
    ///
    /// Returns the corrected feet position plus one contact per obstacle
    /// touched, in obstacle order.
    pub fn resolve_overlaps(&self, feet: Vec3, radius: f32, height: f32) -> (Vec3, Vec<ObstacleContact>) {
        let mut feet = feet;
        let mut contacts = Vec::new();
        for obstacle in &self.obstacles {
            let b = &obstacle.bounds;
            if feet.y >= b.max.y - STEP_HEIGHT || feet.y + height <= b.min.y {
                continue;
            }
            let closest = Vec3::new(feet.x.clamp(b.min.x, b.max.x), 0.0, feet.z.clamp(b.min.z, b.max.z));
            let (dx, dz) = (feet.x - closest.x, feet.z - closest.z);
            let d2 = dx * dx + dz * dz;
            if d2 >= radius * radius {
                continue;
            }
            contacts.push(ObstacleContact {
                point:       Vec3::new(closest.x, (feet.y + height * 0.5).min(b.max.y), closest.z),
                center:      b.center(),
                top_y:       b.max.y,
                traversable: obstacle.traversable,
            });

            if d2 > 1e-8 {
                let d = d2.sqrt();
                feet.x += dx / d * (radius - d);
                feet.z += dz / d * (radius - d);
            } else {
                // Center inside the footprint: leave through the nearest side.
                let exits = [
                    (feet.x - b.min.x, Vec3::NEG_X),
                    (b.max.x - feet.x, Vec3::X),
                    (feet.z - b.min.z, Vec3::NEG_Z),
                    (b.max.z - feet.z, Vec3::Z),
                ];
                if let Some(&(depth, dir)) = exits.iter().min_by(|a, b| a.0.total_cmp(&b.0)) {
                    feet += dir * (depth + radius);
                }
            }
        }
        (feet, contacts)
    }
}

impl CollisionQuery for FlatWorld {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, _ignore: Option<EntityId>) -> Option<RayHit> {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let mut best: Option<RayHit> = None;
        let mut consider = |distance: f32, normal: Vec3| {
            if distance <= max_dist && best.is_none_or(|hit| distance < hit.distance) {
                best = Some(RayHit { point: origin + dir * distance, normal, distance, entity: None });
            }
        };

        if dir.y < -1e-6 {
            let t = (self.ground_y - origin.y) / dir.y;
            if t >= 0.0 && self.on_floor(origin + dir * t) {
                consider(t, Vec3::Y);
            }
        }
        for obstacle in &self.obstacles {
            if let Some((t, normal)) = ray_box(origin, dir, &obstacle.bounds) {
                consider(t, if normal == Vec3::ZERO { -dir } else { normal });
            }
        }
        best
    }
}

/// Straight-line navigation over the floor footprints.
impl PathProvider for FlatWorld {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> Option<NavPath> {
        self.on_floor(to).then(|| NavPath::straight(from, to))
    }

    fn sample_position(&self, near: Vec3, max_dist: f32) -> Option<Vec3> {
        let limit = max_dist * max_dist;
        self.floor
            .iter()
            .map(|a| Vec3::new(near.x.clamp(a.min.x, a.max.x), self.ground_y, near.z.clamp(a.min.z, a.max.z)))
            .map(|p| (p, horizontal_dist_sqr(p, near)))
            .filter(|&(_, d2)| d2 <= limit)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }
}

fn covers_xz(area: &Aabb, p: Vec3) -> bool {
    p.x >= area.min.x && p.x <= area.max.x && p.z >= area.min.z && p.z <= area.max.z
}

/// Slab test.  Returns the entry distance and the entry face normal, which is
/// zero when `origin` starts inside the box.
fn ray_box(origin: Vec3, dir: Vec3, b: &Aabb) -> Option<(f32, Vec3)> {
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;
    let mut normal = Vec3::ZERO;
    for axis in 0..3 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], b.min[axis], b.max[axis]);
        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_min {
            t_min = t0;
            normal = -Vec3::AXES[axis] * d.signum();
        }
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some((t_min, normal))
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some((-b - disc.sqrt()).max(0.0))
}

// ── Bodies ────────────────────────────────────────────────────────────────────

/// Where a body was at the start of the tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    /// Feet.
    pub position: Vec3,
    pub forward:  Vec3,
    pub height:   f32,
}

impl Pose {
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.height * 0.5)
    }
}

/// Per-tick pose snapshot of every live body, zombie or survivor.
#[derive(Clone, Debug, Default)]
pub struct Bodies {
    poses: BTreeMap<EntityId, Pose>,
}

impl Bodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityId, pose: Pose) {
        self.poses.insert(entity, pose);
    }

    pub fn remove(&mut self, entity: EntityId) {
        self.poses.remove(&entity);
    }

    pub fn get(&self, entity: EntityId) -> Option<&Pose> {
        self.poses.get(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Pose)> + '_ {
        self.poses.iter().map(|(&e, p)| (e, p))
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn clear(&mut self) {
        self.poses.clear();
    }
}

impl EntityLocator for Bodies {
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.poses.get(&entity).map(|p| p.position)
    }

    fn forward(&self, entity: EntityId) -> Option<Vec3> {
        self.poses.get(&entity).map(|p| p.forward)
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

/// Static geometry plus this tick's bodies.
#[derive(Copy, Clone)]
pub struct Scene<'a> {
    pub world:  &'a FlatWorld,
    pub bodies: &'a Bodies,
}

impl CollisionQuery for Scene<'_> {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, ignore: Option<EntityId>) -> Option<RayHit> {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let mut best = self.world.raycast(origin, dir, max_dist, ignore);
        for (entity, pose) in self.bodies.iter() {
            if Some(entity) == ignore {
                continue;
            }
            let center = pose.center();
            let Some(t) = ray_sphere(origin, dir, center, pose.height * 0.5) else {
                continue;
            };
            if t <= max_dist && best.is_none_or(|hit| t < hit.distance) {
                let point = origin + dir * t;
                best = Some(RayHit {
                    point,
                    normal: (point - center).normalize_or_zero(),
                    distance: t,
                    entity: Some(entity),
                });
            }
        }
        best
    }

    /// Bodies never hold each other up.
    fn ground_probe(&self, origin: Vec3, _radius: f32, max_dist: f32) -> Option<RayHit> {
        self.world.raycast(origin, Vec3::NEG_Y, max_dist, None)
    }
}
