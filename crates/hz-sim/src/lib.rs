//! `hz-sim`: tick loop orchestrator for the horde AI.
//!
//! # Fixed-step tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ⓪ Snapshot   : body poses and the R-tree over zombie positions.
//!   ① Damage     : queued hits applied; deaths reported to partition and
//!                  horde manager, witnesses notified, the dead removed.
//!   ② Perception : sensing + aggro; targets written to the blackboard,
//!                  triggered/lost events flip `Aggroed` and the color.
//!   ③ Behavior   : per zombie in id order: deliver signals, update tree.
//!   ④ Effects    : melee swings start timers, named events become impulses.
//!   ⑤ Steering   : fixed update; arrivals queued as signals.
//!   ⑥ Integrate  : gravity, floor, obstacle push-out and climbs; survivors
//!                  walk their routes.
//!   ⑦ Melee      : recovered swings hit the nearest survivor in reach.
//!   ⑧ Triggers   : survivor enter/exit drives repopulation; zombies change
//!                  owning partition.
//!   ⑨ Horde      : horde timer and stalker clock.
//!   ⑩ Spawn      : at most one queued request, subject to the zombie cap.
//!   ⑪ Fall-out   : zombies below the kill height are removed.
//!   ⑫ Kill aura  : if enabled.
//! ```
//!
//! # Cargo features
//!
//! | Feature | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Serialize/Deserialize on `ZombieConfig` and friends.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use hz_behavior::BehaviorAsset;
//! use hz_core::SimConfig;
//! use hz_sim::{Console, NoopObserver, SimBuilder, SurvivorSpawn};
//!
//! let asset = BehaviorAsset::load_file("zombie.xml")?;
//! let mut sim = SimBuilder::new(SimConfig::default(), world, graph, asset)
//!     .survivor(SurvivorSpawn::standing(start))
//!     .build()?;
//! Console::new().execute(&mut sim, "starthorde 30")?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod agent;
pub mod builder;
pub mod console;
pub mod context;
pub mod error;
pub mod observer;
pub mod sim;
pub mod stats;
pub mod world;


pub use agent::{
    AgentEffect, AgentHost, Health, MeleeConfig, Presentation, Survivor, SurvivorConfig, SurvivorSpawn, Zombie,
    ZombieConfig,
};
pub use builder::SimBuilder;
pub use console::{Command, CommandFn, Console};
pub use context::SimContext;
pub use error::{SimError, SimResult};
pub use observer::{AgentSnapshot, NoopObserver, SimObserver, TickSummary};
pub use sim::{Sim, AGGROED_KEY, PLAYER_KEY, WIPE_DAMAGE};
pub use stats::{AiStats, HordeStatus, PartitionStats};
pub use world::{Bodies, FlatWorld, Obstacle, Pose, Scene};
