//! Minimal rigid body: unit mass, gravity, optional kinematic mode.

use hz_core::math::{right_of, GRAVITY};
use hz_core::Vec3;

/// Physical state of one capsule-shaped character.
///
/// `position` is the foot point (bottom of the capsule); [`Body::center`]
/// gives the capsule center.  Mass is 1, so an impulse is a direct velocity
/// change and a force is an acceleration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    pub position:  Vec3,
    pub velocity:  Vec3,
    /// Unit facing direction.
    pub forward:   Vec3,
    pub height:    f32,
    pub radius:    f32,
    /// Kinematic bodies ignore forces and gravity; only direct position
    /// writes move them.
    pub kinematic: bool,
    accel:         Vec3,
}

impl Body {
    pub const DEFAULT_HEIGHT: f32 = 2.0;
    pub const DEFAULT_RADIUS: f32 = 0.5;

    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity:  Vec3::ZERO,
            forward:   Vec3::Z,
            height:    Self::DEFAULT_HEIGHT,
            radius:    Self::DEFAULT_RADIUS,
            kinematic: false,
            accel:     Vec3::ZERO,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.height * 0.5)
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        right_of(self.forward)
    }

    /// Accumulate an acceleration for the next `integrate`.
    #[inline]
    pub fn add_acceleration(&mut self, a: Vec3) {
        self.accel += a;
    }

    /// Instantaneous velocity change.
    #[inline]
    pub fn add_impulse(&mut self, dv: Vec3) {
        if !self.kinematic {
            self.velocity += dv;
        }
    }

    /// Pending acceleration (for inspection in tests and debugging).
    #[inline]
    pub fn pending_acceleration(&self) -> Vec3 {
        self.accel
    }

    /// Semi-implicit Euler step.  Clears the accumulated acceleration.
    pub fn integrate(&mut self, dt: f32) {
        if self.kinematic {
            self.accel = Vec3::ZERO;
            return;
        }
        self.velocity += (self.accel - Vec3::Y * GRAVITY) * dt;
        self.position += self.velocity * dt;
        self.accel = Vec3::ZERO;
    }

    /// Push the body up onto a surface at `ground_y` if it sank below it.
    /// Returns `true` if a correction was made.
    pub fn rest_on(&mut self, ground_y: f32) -> bool {
        if self.kinematic || self.position.y >= ground_y {
            return false;
        }
        self.position.y = ground_y;
        if self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
        true
    }

    /// Move instantly, dropping all motion.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.accel = Vec3::ZERO;
    }
}
