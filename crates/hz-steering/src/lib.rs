//! `hz-steering`: locomotion for AI bodies.
//!
//! A [`SteeringController`] owns one [`Body`] and, once per fixed tick,
//! turns high-level intent (a destination, a jump, raw movement input) into
//! accelerations.  The world integrates positions afterwards.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`params`]      | `LookMode`, `SteeringWeights`, tuning structs, `SteeringConfig` |
//! | [`body`]        | `Body`: position, velocity, facing, capsule size           |
//! | [`query`]       | `CollisionQuery`, `PathProvider`, `NeighborQuery`, `NavPath` |
//! | [`behaviors`]   | Pure steering functions (wander, avoidance, separation, …) |
//! | [`orient`]      | `OrientTowards`: turn-rate-limited facing                   |
//! | [`controller`]  | `SteeringController`, `LocomotionMode`, `SteeringEvent`     |
//! | [`error`]       | `SteeringError`, `SteeringResult<T>`                        |
//!
//! # Per-tick order
//!
//! ```text
//! grounding probe → jump → pending destination
//!   ├─ obstacle climb active  → climb toward target (kinematic)
//!   ├─ grounded               → steering blend → ground force → neighbors → speed cap
//!   └─ airborne               → stick-to-ground (walked off a ledge) → air control
//! braking falloff → orientation
//! ```

pub mod behaviors;
pub mod body;
pub mod controller;
pub mod error;
pub mod orient;
pub mod params;
pub mod query;

#[cfg(test)]
mod tests;

pub use body::Body;
pub use controller::{LocomotionMode, SteeringController, SteeringEnv, SteeringEvent};
pub use error::{SteeringError, SteeringResult};
pub use orient::{OrientTarget, OrientTowards};
pub use params::{AvoidanceTuning, LookMode, SteeringConfig, SteeringWeights, WanderTuning};
pub use query::{
    CollisionQuery, NavPath, NeighborQuery, ObstacleContact, OffMeshLink, PathProvider, RayHit,
};
