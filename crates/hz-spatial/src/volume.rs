//! Axis-aligned trigger and spawn volumes.

use hz_core::{SimRng, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning `a` and `b`, whichever corners they are.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Uniform point on the floor of the box: random `x`/`z`, `y` at the
    /// bottom face.
    pub fn random_floor_point(&self, rng: &mut SimRng) -> Vec3 {
        Vec3::new(
            rng.range_f32(self.min.x, self.max.x),
            self.min.y,
            rng.range_f32(self.min.z, self.max.z),
        )
    }
}
