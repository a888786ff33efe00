//! Global population control: the zombie cap, horde mode, stalkers, and the
//! spawn queue drain.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use hz_core::{EntityId, PartitionId, SimRng, SpawnerId, Vec3, ZombieType};

use crate::{PartitionGraph, SpawnQueue, SpawnRequest};

/// Maximum zombies alive at once.
pub const ZOMBIE_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HordeConfig {
    pub zombie_limit:       usize,
    /// Horde length when none is given.
    pub default_horde_secs: f32,
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            zombie_limit:       ZOMBIE_LIMIT,
            default_horde_secs: 10.0,
        }
    }
}

/// Stalkers arrive in small packs on a timer, already hunting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StalkerConfig {
    pub enabled:             bool,
    pub num_stalkers:        i32,
    pub num_stalkers_random: i32,
    /// Seconds between packs.
    pub spawn_time:          f32,
    pub spawn_time_random:   f32,
}

impl Default for StalkerConfig {
    fn default() -> Self {
        Self {
            enabled:             false,
            num_stalkers:        2,
            num_stalkers_random: 1,
            spawn_time:          30.0,
            spawn_time_random:   5.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HordeDuration {
    Secs(f32),
    Forever,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum HordeState {
    Idle,
    Timed(f32),
    Forever,
}

/// A dequeued request that passed the cap: where to put the new zombie.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpawnOrder {
    pub spawner:     SpawnerId,
    pub partition:   PartitionId,
    pub position:    Vec3,
    pub zombie_type: ZombieType,
}

// ── HordeManager ──────────────────────────────────────────────────────────────

pub struct HordeManager {
    pub config:     HordeConfig,
    pub stalkers:   StalkerConfig,
    zombies:        BTreeSet<EntityId>,
    state:          HordeState,
    stalker_timer:  f32,
    total_slain:    u64,
    dropped_spawns: u64,
    queue:          SpawnQueue,
    rng:            SimRng,
}

impl HordeManager {
    pub fn new(config: HordeConfig, stalkers: StalkerConfig, mut rng: SimRng) -> Self {
        let stalker_timer = rng.jitter(stalkers.spawn_time, stalkers.spawn_time_random);
        Self {
            config,
            stalkers,
            zombies: BTreeSet::new(),
            state: HordeState::Idle,
            stalker_timer,
            total_slain: 0,
            dropped_spawns: 0,
            queue: SpawnQueue::new(),
            rng,
        }
    }

    // ── Horde mode ────────────────────────────────────────────────────────

    pub fn is_horde_active(&self) -> bool {
        !matches!(self.state, HordeState::Idle)
    }

    /// Seconds left on a timed horde; `None` when idle or indefinite.
    pub fn horde_time_left(&self) -> Option<f32> {
        match self.state {
            HordeState::Timed(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_horde_forever(&self) -> bool {
        matches!(self.state, HordeState::Forever)
    }

    /// Start (or restart) a horde and pick a random survivor for every
    /// registered zombie.  Returns the `(zombie, survivor)` assignments for
    /// the host to apply; none when there are no survivors.
    pub fn instigate_horde(&mut self, duration: HordeDuration, survivors: &[EntityId]) -> Vec<(EntityId, EntityId)> {
        self.state = match duration {
            HordeDuration::Secs(t) if t > 0.0 => HordeState::Timed(t),
            HordeDuration::Secs(_) => HordeState::Idle,
            HordeDuration::Forever => HordeState::Forever,
        };
        debug!(duration = ?duration, zombies = self.zombies.len(), "horde started");

        let mut assignments = Vec::with_capacity(self.zombies.len());
        for &zombie in &self.zombies {
            if let Some(&survivor) = self.rng.choose(survivors) {
                assignments.push((zombie, survivor));
            }
        }
        assignments
    }

    pub fn end_horde(&mut self) {
        if self.is_horde_active() {
            debug!("horde ended");
        }
        self.state = HordeState::Idle;
    }

    // ── Stalkers ──────────────────────────────────────────────────────────

    pub fn enable_stalkers(&mut self) {
        self.stalkers.enabled = true;
    }

    /// Each fuse lit (1 to 3) brings packs a second closer together.
    pub fn amp_up_stalker_level(&mut self, fuses: u32) {
        if (1..=3).contains(&fuses) {
            self.stalkers.spawn_time = (self.stalkers.spawn_time - 1.0).max(0.0);
        }
    }

    fn stalker_update(&mut self, dt: f32, graph: &PartitionGraph) {
        if self.stalker_timer > 0.0 {
            self.stalker_timer -= dt;
            return;
        }
        self.stalker_timer = self.rng.jitter(self.stalkers.spawn_time, self.stalkers.spawn_time_random);

        let candidates: Vec<PartitionId> = graph.relevant_but_unoccupied().into_iter().collect();
        let Some(&partition) = self.rng.choose(&candidates) else {
            trace!("no partition available for stalkers");
            return;
        };
        let Ok(p) = graph.get(partition) else {
            return;
        };
        let Some(&spawner) = self.rng.choose(&p.spawners) else {
            trace!(partition = %p.name, "stalker partition has no spawners");
            return;
        };
        let spread = self.stalkers.num_stalkers_random;
        let count = self.stalkers.num_stalkers + self.rng.range_i32(-spread, spread);
        for _ in 0..count.max(0) {
            self.queue.push(SpawnRequest { spawner, zombie_type: ZombieType::Stalker });
        }
        debug!(partition = %p.name, count, "stalkers queued");
    }

    // ── Per-tick ──────────────────────────────────────────────────────────

    /// Advance the horde timer and the stalker clock.
    pub fn update(&mut self, dt: f32, graph: &PartitionGraph) {
        if let HordeState::Timed(t) = self.state {
            let left = t - dt;
            if left > 0.0 {
                self.state = HordeState::Timed(left);
            } else {
                self.end_horde();
            }
        }
        if self.stalkers.enabled {
            self.stalker_update(dt, graph);
        }
    }

    /// Serve at most one queued request.  At the cap the request is consumed
    /// and dropped without feedback.
    pub fn next_spawn(&mut self, graph: &PartitionGraph) -> Option<SpawnOrder> {
        let request = self.queue.pop()?;
        if self.zombies.len() >= self.config.zombie_limit {
            self.dropped_spawns += 1;
            trace!(spawner = %request.spawner, "spawn dropped at zombie limit");
            return None;
        }
        let spawner = graph.spawner(request.spawner).ok()?;
        Some(SpawnOrder {
            spawner:     spawner.id,
            partition:   spawner.partition,
            position:    spawner.bounds.random_floor_point(&mut self.rng),
            zombie_type: request.zombie_type,
        })
    }

    // ── Queue ─────────────────────────────────────────────────────────────

    pub fn queue_spawn(&mut self, request: SpawnRequest) {
        self.queue.push(request);
    }

    pub fn queue_spawns(&mut self, requests: impl IntoIterator<Item = SpawnRequest>) {
        self.queue.extend(requests);
    }

    pub fn queue(&self) -> &SpawnQueue {
        &self.queue
    }

    // ── Zombie roster ─────────────────────────────────────────────────────

    pub fn register_zombie(&mut self, zombie: EntityId) {
        self.zombies.insert(zombie);
    }

    pub fn unregister_zombie(&mut self, zombie: EntityId) {
        self.zombies.remove(&zombie);
    }

    pub fn report_ai_death(&mut self, zombie: EntityId) {
        self.total_slain += 1;
        self.unregister_zombie(zombie);
    }

    pub fn zombies(&self) -> &BTreeSet<EntityId> {
        &self.zombies
    }

    pub fn zombie_count(&self) -> usize {
        self.zombies.len()
    }

    pub fn total_slain(&self) -> u64 {
        self.total_slain
    }

    /// Requests consumed at the cap.
    pub fn dropped_spawns(&self) -> u64 {
        self.dropped_spawns
    }

    /// The stream behind spawner, target, and stalker choices.
    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Back to a fresh level: no zombies, no horde, empty queue.
    pub fn reset(&mut self) {
        self.zombies.clear();
        self.state = HordeState::Idle;
        self.total_slain = 0;
        self.dropped_spawns = 0;
        self.queue.clear();
        self.stalker_timer = self.rng.jitter(self.stalkers.spawn_time, self.stalkers.spawn_time_random);
    }
}
