//! Steering tuning.
//!
//! Every field has a default matching a stock zombie; behavior nodes
//! (`SteerTo`, `SetSteeringParameters`) overwrite subsets on entry.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::{SteeringError, SteeringResult};

/// What the body turns to face while moving.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LookMode {
    /// Toward the target entity's position.
    TowardsTarget,
    /// Toward the target entity's head (position plus sensable head offset).
    TowardsFace,
    /// Toward the next path corner.
    AlongPath,
    /// Along the blended steering direction.
    DesiredVel,
    /// Along the body's actual velocity.
    ActualVel,
    /// Facing is left to whoever drives `OrientTowards` directly.
    #[default]
    Unoriented,
}

impl LookMode {
    pub const ALL: [LookMode; 6] = [
        LookMode::TowardsTarget,
        LookMode::TowardsFace,
        LookMode::AlongPath,
        LookMode::DesiredVel,
        LookMode::ActualVel,
        LookMode::Unoriented,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LookMode::TowardsTarget => "TowardsTarget",
            LookMode::TowardsFace   => "TowardsFace",
            LookMode::AlongPath     => "AlongPath",
            LookMode::DesiredVel    => "DesiredVel",
            LookMode::ActualVel     => "ActualVel",
            LookMode::Unoriented    => "Unoriented",
        }
    }
}

impl fmt::Display for LookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LookMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown look mode `{s}`"))
    }
}

// ── Weights ───────────────────────────────────────────────────────────────────

/// Per-behavior multipliers for the steering blend.  A zero weight disables
/// that behavior entirely (it is not even evaluated).
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SteeringWeights {
    pub avoidance:  f32,
    pub pathing:    f32,
    pub separation: f32,
    pub braking:    f32,
    pub wander:     f32,
    pub run_at:     f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            avoidance:  1.0,
            pathing:    1.0,
            separation: 1.0,
            braking:    1.0,
            wander:     1.0,
            run_at:     1.0,
        }
    }
}

/// Obstacle-avoidance feelers.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvoidanceTuning {
    /// Probe length.
    pub distance:  f32,
    /// Feeler spread in degrees (each feeler deviates up to half of it).
    pub spread:    f32,
    /// Scale of the instantaneous velocity kick away from obstacles.
    pub insta_vel: f32,
    pub feelers:   u32,
}

impl Default for AvoidanceTuning {
    fn default() -> Self {
        Self { distance: 6.0, spread: 1.1, insta_vel: 1.0, feelers: 1 }
    }
}

/// Wander circle projected ahead of the body.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WanderTuning {
    pub distance: f32,
    pub radius:   f32,
    /// Maximum angular drift of the wander target, radians per second.
    pub jitter:   f32,
}

impl Default for WanderTuning {
    fn default() -> Self {
        Self { distance: 1.0, radius: 1.0, jitter: PI }
    }
}

// ── SteeringConfig ────────────────────────────────────────────────────────────

/// Everything a `SteeringController` can be tuned with.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SteeringConfig {
    /// Ground acceleration applied along the input direction.
    pub move_speed:         f32,
    /// Horizontal speed cap while grounded.
    pub max_speed:          f32,
    /// Arrival radius around the final destination.
    pub near_dist:          f32,
    /// Fraction of `move_speed` available while airborne.
    pub air_control:        f32,
    /// Radius used when refreshing separation neighbors.
    pub neighborhood_range: f32,
    /// Seconds for `brake()` to bring the body to rest.
    pub brake_time:         f32,
    pub look_mode:          LookMode,
    pub avoidance:          AvoidanceTuning,
    pub wander:             WanderTuning,
    pub weights:            SteeringWeights,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            move_speed:         25.0,
            max_speed:          15.0,
            near_dist:          1.0,
            air_control:        0.2,
            neighborhood_range: 5.0,
            brake_time:         0.5,
            look_mode:          LookMode::Unoriented,
            avoidance:          AvoidanceTuning::default(),
            wander:             WanderTuning::default(),
            weights:            SteeringWeights::default(),
        }
    }
}

impl SteeringConfig {
    /// Reject values that would make the controller divide by zero or never
    /// arrive.
    pub fn validate(&self) -> SteeringResult<()> {
        let positive = [
            ("max_speed",  self.max_speed),
            ("near_dist",  self.near_dist),
            ("brake_time", self.brake_time),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(SteeringError::InvalidParameter {
                    name,
                    value,
                    reason: "must be positive",
                });
            }
        }
        let non_negative = [
            ("move_speed",         self.move_speed),
            ("air_control",        self.air_control),
            ("neighborhood_range", self.neighborhood_range),
            ("avoidance.distance", self.avoidance.distance),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(SteeringError::InvalidParameter {
                    name,
                    value,
                    reason: "must not be negative",
                });
            }
        }
        Ok(())
    }
}
