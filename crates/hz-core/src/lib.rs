//! `hz-core`: foundational types for the horde AI workspace.
//!
//! Every other `hz-*` crate depends on this one.  It has no `hz-*`
//! dependencies and few external ones (`glam`, `rand`, `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`ids`]       | `EntityId`, `NodeId`, `PartitionId`, `SpawnerId`           |
//! | [`math`]      | glam re-exports, `Color`, jump solver, `rotate_towards`    |
//! | [`time`]      | `Tick`, `SimClock`, `SimConfig`                            |
//! | [`rng`]       | `AgentRng` (per-entity), `SimRng` (global)                 |
//! | [`faction`]   | `Faction`, `ZombieType`                                    |
//! | [`event`]     | `EventChannel<E>`: typed, per-entity event delivery       |
//! | [`locator`]   | `EntityLocator` trait (position/facing lookups)            |
//! | [`error`]     | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod error;
pub mod event;
pub mod faction;
pub mod ids;
pub mod locator;
pub mod math;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use event::EventChannel;
pub use faction::{Faction, ZombieType};
pub use ids::{EntityId, NodeId, PartitionId, SpawnerId};
pub use locator::EntityLocator;
pub use math::{Color, Quat, Vec2, Vec3};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, Tick};
