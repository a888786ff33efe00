//! `hz-spatial`: where zombies exist and how many.
//!
//! The level is split into [`Partition`]s joined by neighbor links.
//! Survivors moving through trigger volumes decide which partitions are
//! relevant; relevant partitions are kept populated through a single spawn
//! queue, and everything else is emptied.  The [`HordeManager`] drains that
//! queue one request per tick under a global cap and runs horde mode and
//! stalker packs on top.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`volume`]     | `Aabb` trigger/spawn volumes                               |
//! | [`partition`]  | `Partition`, `Spawner`                                     |
//! | [`graph`]      | `PartitionGraph`: occupancy, relevance, repopulation       |
//! | [`queue`]      | `SpawnQueue`, `SpawnRequest`                               |
//! | [`horde`]      | `HordeManager`, `HordeConfig`, `StalkerConfig`, `ZOMBIE_LIMIT` |
//! | [`triggers`]   | `TriggerTracker`: positions to enter/exit events           |
//! | [`proximity`]  | `ProximityIndex`: R-tree neighbor lookups                  |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Population flow
//!
//! ```text
//! mover position ─► TriggerTracker ─► report_enter / report_exit
//!                                            │
//!                                      repopulate()
//!                                   ┌────────┴────────┐
//!                               despawn           SpawnRequests
//!                                                      │
//!                                   HordeManager queue ─► next_spawn (1/tick, capped)
//! ```

pub mod error;
pub mod graph;
pub mod horde;
pub mod partition;
pub mod proximity;
pub mod queue;
pub mod triggers;
pub mod volume;


pub use error::{SpatialError, SpatialResult};
pub use graph::{PartitionGraph, Repopulation, HISTORY_LEN};
pub use horde::{HordeConfig, HordeDuration, HordeManager, SpawnOrder, StalkerConfig, ZOMBIE_LIMIT};
pub use partition::{Partition, Spawner};
pub use proximity::ProximityIndex;
pub use queue::{SpawnQueue, SpawnRequest};
pub use triggers::{TriggerEvent, TriggerTracker};
pub use volume::Aabb;
