//! Simulation observer trait for progress reporting and data collection.

use hz_core::{EntityId, Faction, PartitionId, Tick, Vec3, ZombieType};

use crate::AiStats;

/// One entity as it stood at a snapshot tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub entity:      EntityId,
    pub faction:     Faction,
    /// `None` for survivors.
    pub zombie_type: Option<ZombieType>,
    pub position:    Vec3,
    pub velocity:    Vec3,
    pub health:      f32,
    pub aggroed:     bool,
    pub target:      Option<EntityId>,
    /// Owning partition for zombies, most recent occupied one for survivors.
    pub partition:   Option<PartitionId>,
}

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickSummary {
    pub spawned:       usize,
    pub despawned:     usize,
    pub zombie_deaths: usize,
    pub aggro_changes: usize,
    pub melee_hits:    usize,
    pub shots:         usize,
    pub zombies_alive: usize,
    pub aggroed:       usize,
    pub queued_spawns: usize,
    pub horde_active:  bool,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: kill counter
///
/// ```rust,ignore
/// struct Deaths(usize);
///
/// impl SimObserver for Deaths {
///     fn on_tick_end(&mut self, _tick: Tick, summary: &TickSummary) {
///         self.0 += summary.zombie_deaths;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick with that tick's tallies.
    fn on_tick_end(&mut self, _tick: Tick, _summary: &TickSummary) {}

    /// Called every `config.output_interval_ticks` ticks with the population
    /// report and every live entity, zombies first, each in id order.
    fn on_snapshot(&mut self, _tick: Tick, _stats: &AiStats, _agents: &[AgentSnapshot]) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
