//! Steering sub-behaviors.
//!
//! Each function maps the current state to a direction.  Directions are
//! returned normalized (or zero); the controller applies the weights.

use std::f32::consts::PI;

use hz_core::math::{right_of, rotate_towards};
use hz_core::{AgentRng, EntityId, Vec3};

use crate::params::{AvoidanceTuning, WanderTuning};
use crate::query::CollisionQuery;

/// Output of the avoidance feelers.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Avoidance {
    /// Sideways push away from the obstacle, unit length or zero.
    pub steer:   Vec3,
    /// Backward push, unit length or zero.
    pub braking: Vec3,
}

/// Drift the wander angle and return the direction toward the wander target.
///
/// The target sits on a circle of `radius` projected `distance` ahead of the
/// body and one unit up; `wander_angle` is the running position on it.
pub fn wander(
    wander_angle: &mut f32,
    tuning:       &WanderTuning,
    forward:      Vec3,
    dt:           f32,
    rng:          &mut AgentRng,
) -> Vec3 {
    *wander_angle += rng.range_f32(-tuning.jitter, tuning.jitter) * dt;
    let circle = Vec3::new(
        wander_angle.cos() * tuning.radius,
        1.0,
        wander_angle.sin() * tuning.radius,
    );
    (circle + forward * tuning.distance).normalize_or_zero()
}

/// Cast the avoidance feelers.
///
/// Each feeler is the facing direction rotated toward the right by a random
/// angle within half the spread (spread is in degrees).  A hit on the right
/// steers left and vice versa; braking grows with the inverse square of the
/// hit distance before normalization.  The last feeler that hits wins.
pub fn avoidance(
    position:  Vec3,
    forward:   Vec3,
    tuning:    &AvoidanceTuning,
    collision: &dyn CollisionQuery,
    me:        EntityId,
    rng:       &mut AgentRng,
) -> Avoidance {
    let right = right_of(forward);
    let half_spread = tuning.spread * PI / 360.0;
    let mut out = Avoidance::default();

    for _ in 0..tuning.feelers {
        let angle = rng.range_f32(-half_spread, half_spread);
        let dir = rotate_towards(forward, right, angle);
        let Some(hit) = collision.raycast(position, dir, tuning.distance, Some(me)) else {
            continue;
        };
        let local_x = (hit.point - position).dot(right);
        out.steer = if local_x > 0.0 { -right } else { right };

        let d2 = (hit.point - position).length_squared().max(1e-4);
        out.braking = (-forward * (1.0 / d2)).normalize_or_zero();
    }
    out.steer = out.steer.normalize_or_zero();
    out
}

/// Direction pushing away from the given neighbor positions.
pub fn separation(position: Vec3, neighbors: impl IntoIterator<Item = Vec3>) -> Vec3 {
    neighbors
        .into_iter()
        .fold(Vec3::ZERO, |acc, n| acc + (position - n))
        .normalize_or_zero()
}

/// Straight-line direction from `from` to `to`.
#[inline]
pub fn seek(from: Vec3, to: Vec3) -> Vec3 {
    (to - from).normalize_or_zero()
}

/// Direction toward the current path corner.  Past the last corner (or with
/// no corners at all) the body heads straight for the destination.
pub fn follow_path(position: Vec3, corners: &[Vec3], corner_index: usize, destination: Vec3) -> Vec3 {
    match corners.get(corner_index) {
        Some(&corner) => seek(position, corner),
        None          => seek(position, destination),
    }
}
