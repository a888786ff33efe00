//! Fluent builder for constructing a [`Sim`].

use hz_behavior::{BbValue, BehaviorAsset, Blackboard};
use hz_core::SimConfig;
use hz_spatial::{HordeConfig, PartitionGraph, StalkerConfig};

use crate::agent::{SurvivorConfig, SurvivorSpawn, ZombieConfig};
use crate::sim::{AGGROED_KEY, PLAYER_KEY};
use crate::world::{Bodies, FlatWorld};
use crate::{Sim, SimContext, SimError, SimResult, TickSummary};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: total ticks, seed, tick duration, …
/// - [`FlatWorld`]: floor footprints and obstacles
/// - [`PartitionGraph`]: rooms, their links, and their spawners
/// - [`BehaviorAsset`]: the tree every zombie runs
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                 |
/// |------------------------|-----------------------------------------|
/// | `.zombie_config(c)`    | `ZombieConfig::default()`               |
/// | `.survivor_config(c)`  | `SurvivorConfig::default()`             |
/// | `.horde_config(c)`     | `HordeConfig::default()` (cap 100)      |
/// | `.stalker_config(c)`   | `StalkerConfig::default()` (disabled)   |
/// | `.blackboard(b)`       | Only the keys the simulation writes     |
/// | `.survivor(s)`         | No survivors                            |
///
/// The keys the simulation writes (`Player`, the aggro target key, and
/// `Aggroed`) are declared on top of any supplied blackboard.
///
/// # Example
///
/// ```rust,ignore
/// let asset = BehaviorAsset::load_file("assets/zombie.xml")?;
/// let mut sim = SimBuilder::new(config, world, graph, asset)
///     .survivor(SurvivorSpawn::walking(start, route))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:          SimConfig,
    world:           FlatWorld,
    graph:           PartitionGraph,
    asset:           BehaviorAsset,
    zombie_config:   Option<ZombieConfig>,
    survivor_config: Option<SurvivorConfig>,
    horde_config:    Option<HordeConfig>,
    stalker_config:  Option<StalkerConfig>,
    blackboard:      Option<Blackboard>,
    survivors:       Vec<SurvivorSpawn>,
}

impl SimBuilder {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, world: FlatWorld, graph: PartitionGraph, asset: BehaviorAsset) -> Self {
        Self {
            config,
            world,
            graph,
            asset,
            zombie_config:   None,
            survivor_config: None,
            horde_config:    None,
            stalker_config:  None,
            blackboard:      None,
            survivors:       Vec::new(),
        }
    }

    pub fn zombie_config(mut self, config: ZombieConfig) -> Self {
        self.zombie_config = Some(config);
        self
    }

    pub fn survivor_config(mut self, config: SurvivorConfig) -> Self {
        self.survivor_config = Some(config);
        self
    }

    pub fn horde_config(mut self, config: HordeConfig) -> Self {
        self.horde_config = Some(config);
        self
    }

    pub fn stalker_config(mut self, config: StalkerConfig) -> Self {
        self.stalker_config = Some(config);
        self
    }

    /// Extra keys every zombie's blackboard starts with.
    pub fn blackboard(mut self, blackboard: Blackboard) -> Self {
        self.blackboard = Some(blackboard);
        self
    }

    /// Add a survivor placed at build time and again on every reset.
    pub fn survivor(mut self, spawn: SurvivorSpawn) -> Self {
        self.survivors.push(spawn);
        self
    }

    /// Validate inputs, place the survivors, and return a ready-to-run
    /// [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        // ── Validate ──────────────────────────────────────────────────────
        if self.config.fixed_dt_secs.is_nan() || self.config.fixed_dt_secs <= 0.0 {
            return Err(SimError::Config(format!(
                "fixed_dt_secs must be positive, got {}",
                self.config.fixed_dt_secs
            )));
        }
        if self.world.floor.is_empty() {
            return Err(SimError::Config("world has no floor".into()));
        }
        let zombie_config = self.zombie_config.unwrap_or_default();
        zombie_config.steering.validate()?;
        if zombie_config.max_health <= 0.0 {
            return Err(SimError::Config(format!(
                "zombie max_health must be positive, got {}",
                zombie_config.max_health
            )));
        }
        let survivor_config = self.survivor_config.unwrap_or_default();
        if survivor_config.max_health <= 0.0 {
            return Err(SimError::Config(format!(
                "survivor max_health must be positive, got {}",
                survivor_config.max_health
            )));
        }
        self.graph.validate();

        // ── Blackboard template ───────────────────────────────────────────
        let mut blackboard = self.blackboard.unwrap_or_default();
        for key in [PLAYER_KEY, zombie_config.aggro.bb_target_key.as_str()] {
            if !blackboard.contains(key) {
                blackboard.declare(key, BbValue::Unset);
            }
        }
        if !blackboard.contains(AGGROED_KEY) {
            blackboard.declare(AGGROED_KEY, 0);
        }

        // ── Assemble and place survivors ──────────────────────────────────
        let ctx = SimContext::new(
            self.config.seed,
            self.graph,
            self.horde_config.unwrap_or_default(),
            self.stalker_config.unwrap_or_default(),
        );
        let mut sim = Sim {
            clock:              self.config.make_clock(),
            config:             self.config,
            world:              self.world,
            ctx,
            zombie_config,
            survivor_config,
            asset:              self.asset,
            blackboard,
            zombies:            Default::default(),
            survivors:          Default::default(),
            health:             Default::default(),
            survivor_templates: self.survivors.clone(),
            bodies:             Bodies::new(),
            next_entity:        0,
            kill_aura:          None,
            partition_overlay:  false,
            summary:            TickSummary::default(),
        };
        for spawn in self.survivors {
            sim.add_survivor(spawn)?;
        }
        Ok(sim)
    }
}
