//! Turn-rate-limited facing.

use hz_core::math::rotate_towards;
use hz_core::{EntityId, EntityLocator, Vec3};

use crate::Body;

/// What [`OrientTowards`] is currently tracking.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum OrientTarget {
    Position(Vec3),
    Entity { entity: EntityId, offset: Vec3 },
    /// The body's own velocity.
    Velocity,
    #[default]
    Unoriented,
}

/// Rotates a body's facing toward its target at `turn_speed` degrees per
/// second.  Locked axes keep the facing's current component on that axis.
#[derive(Clone, Debug, PartialEq)]
pub struct OrientTowards {
    pub target:     OrientTarget,
    /// Degrees per second.
    pub turn_speed: f32,
    pub x_locked:   bool,
    pub y_locked:   bool,
    pub z_locked:   bool,
}

impl Default for OrientTowards {
    fn default() -> Self {
        Self {
            target:     OrientTarget::Unoriented,
            turn_speed: 90.0,
            x_locked:   false,
            y_locked:   false,
            z_locked:   false,
        }
    }
}

impl OrientTowards {
    pub fn set_pos_target(&mut self, pos: Vec3) {
        self.target = OrientTarget::Position(pos);
    }

    pub fn set_entity_target(&mut self, entity: EntityId, offset: Vec3) {
        self.target = OrientTarget::Entity { entity, offset };
    }

    pub fn set_locks(&mut self, x: bool, y: bool, z: bool) {
        self.x_locked = x;
        self.y_locked = y;
        self.z_locked = z;
    }

    fn apply_locks(&self, towards: &mut Vec3, forward: Vec3) {
        if self.x_locked {
            towards.x = forward.x;
        }
        if self.y_locked {
            towards.y = forward.y;
        }
        if self.z_locked {
            towards.z = forward.z;
        }
    }

    /// Turn `body` one step toward the target.
    pub fn update(&self, body: &mut Body, dt: f32, entities: &dyn EntityLocator) {
        let mut towards = match self.target {
            OrientTarget::Unoriented => return,
            OrientTarget::Position(p) => p - body.position,
            OrientTarget::Entity { entity, offset } => match entities.position(entity) {
                Some(p) => p + offset - body.position,
                None    => return,
            },
            OrientTarget::Velocity => {
                if body.velocity.length_squared() <= 0.01 {
                    return;
                }
                body.velocity.normalize()
            }
        };
        self.apply_locks(&mut towards, body.forward);

        let max_radians = self.turn_speed.to_radians() * dt;
        let turned = rotate_towards(body.forward, towards, max_radians);
        if let Some(unit) = turned.try_normalize() {
            body.forward = unit;
        }
    }
}
