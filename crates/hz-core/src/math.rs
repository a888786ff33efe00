//! Vector math shared by steering, perception, and the node catalogue.
//!
//! Positions and directions are `glam::Vec3` with `+Y` up.  The facing
//! convention is: `right = Y × forward`, so an entity facing `+Z` has `+X`
//! on its right.

pub use glam::{Quat, Vec2, Vec3};

/// Gravitational acceleration magnitude (m/s²).
pub const GRAVITY: f32 = 9.81;

/// Threshold below which a vector is treated as having no direction.
const DIRECTION_EPSILON: f32 = 1e-6;

// ── Color ─────────────────────────────────────────────────────────────────────

/// Linear RGBA color, each channel in `[0, 1]`.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE:   Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK:   Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED:     Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const MAGENTA: Color = Color::rgba(1.0, 0.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

// ── Distances ─────────────────────────────────────────────────────────────────

#[inline]
pub fn dist_sqr(a: Vec3, b: Vec3) -> f32 {
    (a - b).length_squared()
}

/// Squared distance ignoring height.
#[inline]
pub fn horizontal_dist_sqr(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// `v` with its vertical component zeroed.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

// ── Facing helpers ────────────────────────────────────────────────────────────

/// Right-hand vector for a facing direction.  Falls back to `+X` when the
/// facing is vertical or degenerate.
pub fn right_of(forward: Vec3) -> Vec3 {
    let right = Vec3::Y.cross(forward);
    if right.length_squared() < DIRECTION_EPSILON {
        Vec3::X
    } else {
        right.normalize()
    }
}

/// Rotate direction `current` toward `target` by at most `max_radians`,
/// keeping the magnitude of `current`.
///
/// A negative `max_radians` rotates away from `target`.  If either input is
/// degenerate `current` is returned unchanged.
pub fn rotate_towards(current: Vec3, target: Vec3, max_radians: f32) -> Vec3 {
    let len = current.length();
    if len < DIRECTION_EPSILON || target.length_squared() < DIRECTION_EPSILON {
        return current;
    }
    let from = current / len;
    let to = target.normalize();
    let angle = from.angle_between(to);
    if max_radians >= angle {
        return to * len;
    }

    let mut axis = from.cross(to);
    if axis.length_squared() < DIRECTION_EPSILON {
        // Antiparallel: any perpendicular axis works, prefer turning about up.
        axis = if from.cross(Vec3::Y).length_squared() > DIRECTION_EPSILON {
            Vec3::Y
        } else {
            Vec3::X
        };
    }
    Quat::from_axis_angle(axis.normalize(), max_radians) * current
}

/// Project `dir` onto the plane with normal `normal` and normalize it.
///
/// Returns zero when `dir` is parallel to `normal`.
pub fn orthonormalize(normal: Vec3, dir: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    (dir - n * dir.dot(n)).normalize_or_zero()
}

/// Remove the component of `v` along `normal`.
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    v - n * v.dot(n)
}

// ── Ballistics ────────────────────────────────────────────────────────────────

/// Launch velocity that carries a body from `start` to `end` over an apex
/// at height `peak`.
///
/// Vertical speed is chosen so the body stops rising exactly at `peak`.
/// Flight time is the rise time plus the fall time from `peak` to `end.y`.
/// Horizontal speed covers the ground distance in that time, reduced by
/// `drag` (a constant deceleration).
pub fn jump_velocity(start: Vec3, end: Vec3, peak: f32, drag: f32) -> Vec3 {
    let rise = (peak - start.y).abs();
    let fall = (peak - end.y).abs();
    let y_vel = (2.0 * GRAVITY * rise).sqrt();
    let time = (2.0 * rise / GRAVITY).sqrt() + (2.0 * fall / GRAVITY).sqrt();

    let ground = Vec2::new(end.x - start.x, end.z - start.z);
    let ground_dist = ground.length();
    let xz_vel = if time > 0.0 {
        (ground_dist - 0.5 * drag * time * time) / time
    } else {
        0.0
    };
    let xz = ground.normalize_or_zero() * xz_vel;
    Vec3::new(xz.x, y_vel, xz.y)
}
