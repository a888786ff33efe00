//! The `Sim` struct and its tick loop.

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use hz_behavior::{BehaviorAsset, Blackboard, Signal, TickContext};
use hz_core::math::dist_sqr;
use hz_core::{AgentRng, Color, EntityId, Faction, SimClock, SimConfig, Tick, Vec3, ZombieType};
use hz_perception::{AggroEffect, DamageEvent, DeathEvent, Sensable, SenseWorld};
use hz_spatial::{HordeDuration, Repopulation, SpawnOrder, SpawnRequest, TriggerEvent};
use hz_steering::{Body, SteeringController, SteeringEnv, SteeringEvent};

use crate::agent::{AgentEffect, AgentHost, Health, Presentation, Survivor, SurvivorConfig, SurvivorSpawn, Zombie, ZombieConfig};
use crate::world::{Bodies, FlatWorld, Pose, Scene};
use crate::{
    AgentSnapshot, AiStats, HordeStatus, PartitionStats, SimContext, SimError, SimObserver, SimResult, TickSummary,
};

/// Blackboard key holding the survivor a zombie was pointed at on spawn.
pub const PLAYER_KEY: &str = "Player";

/// Blackboard key set to 1 while the zombie is aggroed and 0 otherwise.
pub const AGGROED_KEY: &str = "Aggroed";

/// Damage dealt by `wipe`.
pub const WIPE_DAMAGE: f32 = 9_999.0;

const KILL_AURA_RANGE:  f32 = 10.0;
const KILL_AURA_DAMAGE: f32 = 100.0;
const KILL_AURA_PERIOD: f32 = 0.2;

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim` owns every entity and drives the fixed-step tick loop:
///
/// 1. **Damage**: queued hits are applied; deaths are reported to the
///    partition graph and horde manager and the dead are removed.
/// 2. **Perception**: sensing and aggro; target changes are written to the
///    blackboard.
/// 3. **Behavior**: each zombie's pending signals are delivered and its tree
///    updated, in id order.
/// 4. **Effects**: melee swings, shots, and named events the trees raised.
/// 5. **Steering** and **integration** of every body.
/// 6. **Melee** recovery, **triggers**, **horde** timers, one **spawn**,
///    the **fall-through** check, and the kill aura.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Global configuration (total ticks, seed, tick duration, …).
    pub config: SimConfig,

    /// Simulation clock: tracks the current tick and maps to wall time.
    pub clock: SimClock,

    /// Static level geometry.
    pub world: FlatWorld,

    /// Perception, partitions, horde manager, and the event channels.
    pub ctx: SimContext,

    pub zombie_config:   ZombieConfig,
    pub survivor_config: SurvivorConfig,

    /// Tree every zombie is instantiated from.
    pub asset: BehaviorAsset,

    /// Blackboard every zombie starts with.
    pub blackboard: Blackboard,

    pub(crate) zombies:            BTreeMap<EntityId, Zombie>,
    pub(crate) survivors:          BTreeMap<EntityId, Survivor>,
    pub(crate) health:             BTreeMap<EntityId, Health>,
    pub(crate) survivor_templates: Vec<SurvivorSpawn>,
    pub(crate) bodies:             Bodies,
    pub(crate) next_entity:        u32,
    pub(crate) kill_aura:          Option<f32>,
    pub(crate) partition_overlay:  bool,
    pub(crate) summary:            TickSummary,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.end_tick()`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        loop {
            let now = self.clock.current_tick;
            if now >= self.config.end_tick() {
                break;
            }
            self.step(now, observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            let now = self.clock.current_tick;
            self.step(now, observer)?;
        }
        Ok(())
    }

    fn step<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<()> {
        observer.on_tick_start(now);
        let summary = self.process_tick(now)?;
        observer.on_tick_end(now, &summary);
        if self.config.output_interval_ticks > 0 && now.0.is_multiple_of(self.config.output_interval_ticks) {
            observer.on_snapshot(now, &self.stats(), &self.snapshots());
            if self.partition_overlay {
                self.log_partitions();
            }
        }
        self.clock.advance();
        Ok(())
    }

    /// Tallies of the most recent tick.
    pub fn last_summary(&self) -> &TickSummary {
        &self.summary
    }

    // ── Entities ──────────────────────────────────────────────────────────

    pub fn zombies(&self) -> &BTreeMap<EntityId, Zombie> {
        &self.zombies
    }

    pub fn zombie(&self, id: EntityId) -> Option<&Zombie> {
        self.zombies.get(&id)
    }

    pub fn zombie_mut(&mut self, id: EntityId) -> Option<&mut Zombie> {
        self.zombies.get_mut(&id)
    }

    pub fn survivors(&self) -> &BTreeMap<EntityId, Survivor> {
        &self.survivors
    }

    pub fn survivor_mut(&mut self, id: EntityId) -> Option<&mut Survivor> {
        self.survivors.get_mut(&id)
    }

    pub fn health(&self, id: EntityId) -> Option<&Health> {
        self.health.get(&id)
    }

    /// Place a survivor and start tracking it for occupancy.
    pub fn add_survivor(&mut self, spawn: SurvivorSpawn) -> SimResult<EntityId> {
        let id = self.allocate_id()?;
        let survivor = Survivor::new(spawn.start, spawn.route, self.survivor_config.walk_speed);
        self.ctx.perception.add_sensable(
            id,
            Sensable::new(Faction::Survivor).with_priority(self.survivor_config.priority),
        );
        self.health.insert(id, Health::new(self.survivor_config.max_health));
        self.ctx.damage.subscribe(id);
        self.ctx.deaths.subscribe(id);
        self.ctx.partitions.register_mover(id);
        self.bodies.insert(id, pose_of(&survivor.body));
        self.survivors.insert(id, survivor);
        debug!(entity = %id, at = ?spawn.start, "survivor added");
        Ok(id)
    }

    /// Bring a zombie into the world as the spawner in `order` dictates.
    /// Fails without touching any registry if the order's partition is
    /// unknown.
    pub fn spawn_zombie(&mut self, order: &SpawnOrder) -> SimResult<EntityId> {
        self.ctx.partitions.get(order.partition)?;
        let id = self.allocate_id()?;
        let cfg = &self.zombie_config;

        let mut blackboard = self.blackboard.clone();
        if let Some(player) = closest_survivor(&self.survivors, order.position, f32::INFINITY) {
            blackboard.set(PLAYER_KEY, player)?;
            blackboard.set(&cfg.aggro.bb_target_key, player)?;
        }
        let zombie = Zombie {
            zombie_type: order.zombie_type,
            steering: SteeringController::new(id, Body::new(order.position), cfg.steering.clone()),
            tree: self.asset.instantiate(),
            blackboard,
            rng: AgentRng::new(self.config.seed, id),
            presentation: Presentation { anim_state_secs: cfg.anim_state_secs, ..Presentation::default() },
            melee_timer: None,
            inbox: Vec::new(),
        };

        self.ctx.perception.add_sensable(id, Sensable::new(Faction::Horde));
        self.ctx.perception.add_sensing(id, cfg.sensing.clone())?;
        self.ctx.perception.add_aggro(id, cfg.aggro.clone())?;
        if order.zombie_type == ZombieType::Stalker {
            self.ctx.perception.set_aggro_time(id, cfg.stalker_aggro_time);
        }
        self.health.insert(id, Health::new(cfg.max_health));
        self.ctx.damage.subscribe(id);
        self.ctx.deaths.subscribe(id);
        self.ctx.horde.register_zombie(id);
        self.ctx.partitions.register_ai(id, order.partition)?;
        self.bodies.insert(id, pose_of(&zombie.steering.body));
        self.zombies.insert(id, zombie);
        debug!(entity = %id, partition = %order.partition, kind = ?order.zombie_type, "zombie spawned");

        if self.ctx.horde.is_horde_active() || order.zombie_type == ZombieType::Stalker {
            let quarry = self
                .ctx
                .perception
                .registry
                .random_with_faction(Faction::Survivor, self.ctx.horde.rng());
            if let Some(quarry) = quarry {
                self.force_aggro(id, quarry)?;
            }
        }
        self.summary.spawned += 1;
        Ok(id)
    }

    /// Queue a hit on `target`.  Applied at the start of the next tick.
    /// Returns `false` if `target` has no health.
    pub fn damage(&mut self, target: EntityId, amount: f32, instigator: Option<EntityId>) -> bool {
        self.ctx.damage.publish(target, DamageEvent { amount, instigator })
    }

    /// Remove a zombie without counting it as a kill.
    pub fn despawn_zombie(&mut self, id: EntityId) -> bool {
        let removed = self.remove_zombie(id);
        if removed {
            self.summary.despawned += 1;
            trace!(entity = %id, "zombie despawned");
        }
        removed
    }

    fn remove_zombie(&mut self, id: EntityId) -> bool {
        if self.zombies.remove(&id).is_none() {
            return false;
        }
        self.ctx.perception.remove(id);
        self.ctx.partitions.unregister_ai(id);
        self.ctx.horde.unregister_zombie(id);
        self.ctx.triggers.remove(id);
        self.ctx.damage.unsubscribe(id);
        self.ctx.deaths.unsubscribe(id);
        self.health.remove(&id);
        self.bodies.remove(id);
        true
    }

    pub fn remove_survivor(&mut self, id: EntityId) -> bool {
        if self.survivors.remove(&id).is_none() {
            return false;
        }
        let repopulation = self.ctx.partitions.unregister_mover(id);
        self.apply_repopulation(repopulation);
        self.ctx.perception.remove(id);
        self.ctx.triggers.remove(id);
        self.ctx.damage.unsubscribe(id);
        self.ctx.deaths.unsubscribe(id);
        self.health.remove(&id);
        self.bodies.remove(id);
        debug!(entity = %id, "survivor removed");
        true
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Start a horde and send every zombie after a random survivor.
    /// Returns how many zombies were given a target.
    pub fn instigate_horde(&mut self, duration: HordeDuration) -> SimResult<usize> {
        let survivors: Vec<EntityId> = self.survivors.keys().copied().collect();
        let assignments = self.ctx.horde.instigate_horde(duration, &survivors);
        for &(zombie, survivor) in &assignments {
            self.force_aggro(zombie, survivor)?;
        }
        Ok(assignments.len())
    }

    pub fn end_horde(&mut self) {
        self.ctx.horde.end_horde();
    }

    /// Raise a named event on every zombie's tree, as if sent by the object
    /// called `source`.
    pub fn raise_event(&mut self, source: Option<&str>, name: &str) {
        let signal = match source {
            Some(source) => Signal::impulse_from(source, name),
            None => Signal::impulse(name),
        };
        for zombie in self.zombies.values_mut() {
            zombie.inbox.push(signal.clone());
        }
    }

    /// Queue lethal damage on every member of `faction`, blamed on the
    /// survivor nearest the origin.  Returns how many were hit.
    pub fn wipe(&mut self, faction: Faction) -> usize {
        let instigator = closest_survivor(&self.survivors, Vec3::ZERO, f32::INFINITY);
        let victims: Vec<EntityId> = match faction {
            Faction::Horde => self.zombies.keys().copied().collect(),
            Faction::Survivor => self.survivors.keys().copied().collect(),
        };
        for &victim in &victims {
            self.damage(victim, WIPE_DAMAGE, instigator);
        }
        info!(faction = faction.name(), count = victims.len(), "wipe");
        victims.len()
    }

    /// Queue `per_spawner` normal spawns at every spawner of every occupied
    /// partition.  Returns how many requests were queued.
    pub fn spawn_near_survivors(&mut self, per_spawner: usize) -> usize {
        let mut requests = Vec::new();
        for id in self.ctx.partitions.occupied() {
            let Ok(partition) = self.ctx.partitions.get(id) else {
                continue;
            };
            for &spawner in &partition.spawners {
                requests.extend(std::iter::repeat_n(SpawnRequest::normal(spawner), per_spawner));
            }
        }
        let queued = requests.len();
        self.ctx.horde.queue_spawns(requests);
        queued
    }

    /// Toggle periodic lethal damage around the survivor nearest the origin.
    /// Returns whether it is now on.
    pub fn toggle_kill_aura(&mut self) -> bool {
        self.kill_aura = match self.kill_aura {
            Some(_) => None,
            None => Some(0.0),
        };
        self.kill_aura.is_some()
    }

    pub fn kill_aura_enabled(&self) -> bool {
        self.kill_aura.is_some()
    }

    /// Toggle logging partition occupancy at every snapshot.
    pub fn toggle_partition_overlay(&mut self) -> bool {
        self.partition_overlay = !self.partition_overlay;
        self.partition_overlay
    }

    /// Back to the level's initial state: every zombie gone, the survivors
    /// the sim was built with back at their starts, counters zeroed.
    pub fn reset(&mut self) -> SimResult<()> {
        self.zombies.clear();
        self.survivors.clear();
        self.health.clear();
        self.bodies.clear();
        self.ctx.teardown();
        self.kill_aura = None;
        for spawn in self.survivor_templates.clone() {
            self.add_survivor(spawn)?;
        }
        info!("level reset");
        Ok(())
    }

    // ── Reporting ─────────────────────────────────────────────────────────

    pub fn stats(&self) -> AiStats {
        let graph = &self.ctx.partitions;
        let horde = &self.ctx.horde;
        let status = if horde.is_horde_forever() {
            HordeStatus::Forever
        } else {
            horde.horde_time_left().map_or(HordeStatus::Inactive, HordeStatus::Timed)
        };
        AiStats {
            zombies_alive:   self.zombies.len(),
            survivors_alive: self.survivors.len(),
            aggroed:         self.ctx.perception.aggroed_count(),
            queued_spawns:   horde.queue().len(),
            total_slain:     horde.total_slain(),
            dropped_spawns:  horde.dropped_spawns(),
            horde:           status,
            partitions:      graph
                .partitions()
                .iter()
                .map(|p| PartitionStats {
                    name:           p.name.clone(),
                    active:         p.active_ai.len(),
                    target:         p.target_walkers,
                    walkers_killed: p.walkers_killed,
                    occupied:       graph.is_occupied(p.id),
                })
                .collect(),
        }
    }

    /// Every live entity, zombies first, each group in id order.
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        let health = |id: EntityId| self.health.get(&id).map_or(0.0, |h| h.current);
        let mut out = Vec::with_capacity(self.zombies.len() + self.survivors.len());
        for (&id, zombie) in &self.zombies {
            let aggro = self.ctx.perception.aggro(id);
            out.push(AgentSnapshot {
                entity:      id,
                faction:     Faction::Horde,
                zombie_type: Some(zombie.zombie_type),
                position:    zombie.steering.body.position,
                velocity:    zombie.steering.body.velocity,
                health:      health(id),
                aggroed:     aggro.is_some_and(|a| a.is_aggroed()),
                target:      aggro.and_then(|a| a.target()),
                partition:   self.ctx.partitions.owner_of(id),
            });
        }
        for (&id, survivor) in &self.survivors {
            out.push(AgentSnapshot {
                entity:      id,
                faction:     Faction::Survivor,
                zombie_type: None,
                position:    survivor.body.position,
                velocity:    survivor.body.velocity,
                health:      health(id),
                aggroed:     false,
                target:      None,
                partition:   self.ctx.partitions.occupied_by(id).last().copied(),
            });
        }
        out
    }

    fn log_partitions(&self) {
        for p in &self.stats().partitions {
            info!(
                partition = %p.name,
                occupied = p.occupied,
                active = p.active,
                target = p.target,
                "partition"
            );
        }
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick(&mut self, now: Tick) -> SimResult<TickSummary> {
        let dt = self.clock.dt();
        let horde_active = self.ctx.horde.is_horde_active();
        self.summary = TickSummary::default();

        // ── Phase 0: snapshot poses ───────────────────────────────────────
        //
        // Every query this tick (sight, blackboard entity lookups, neighbor
        // search) sees where bodies stood when the tick began.
        self.bodies.clear();
        for (&id, zombie) in &self.zombies {
            self.bodies.insert(id, pose_of(&zombie.steering.body));
        }
        for (&id, survivor) in &self.survivors {
            self.bodies.insert(id, pose_of(&survivor.body));
        }
        self.ctx
            .proximity
            .rebuild(self.zombies.iter().map(|(&id, z)| (id, z.position())));

        // ── Phase 1: damage and deaths ────────────────────────────────────
        for (target, hit) in self.ctx.damage.drain() {
            let Some(health) = self.health.get_mut(&target) else {
                continue;
            };
            let died = health.apply(&hit);
            if self.zombies.contains_key(&target) {
                self.ctx.perception.on_damaged(target, &self.bodies);
            }
            if died {
                self.ctx.deaths.publish(target, DeathEvent { instigator: hit.instigator });
            }
        }
        for (target, death) in self.ctx.deaths.drain() {
            self.handle_death(target, death, horde_active);
        }

        // ── Phase 2: perception ───────────────────────────────────────────
        let scene = Scene { world: &self.world, bodies: &self.bodies };
        let changes = self.ctx.perception.tick(dt, horde_active, SenseWorld {
            entities:  &self.bodies,
            collision: &scene,
        });
        self.summary.aggro_changes = changes.len();
        for change in &changes {
            if let AggroEffect::Targeted { target } = change.effect {
                self.write_target(change.entity, target)?;
            }
        }
        for (id, _) in self.ctx.perception.aggro_triggered.drain() {
            self.mark_aggroed(id, true)?;
        }
        for (id, _) in self.ctx.perception.aggro_lost.drain() {
            self.mark_aggroed(id, false)?;
        }

        // ── Phase 3: behavior trees ───────────────────────────────────────
        //
        // Signals queued last tick (arrivals, melee recoveries, impulses) are
        // delivered first so the update sees their outcome.
        let mut effects: Vec<(EntityId, Vec<AgentEffect>)> = Vec::new();
        for (&id, zombie) in &mut self.zombies {
            let Zombie { steering, tree, blackboard, rng, presentation, inbox, .. } = zombie;
            let mut out = Vec::new();
            let mut host = AgentHost {
                steering,
                presentation,
                effects:  &mut out,
                bodies:   &self.bodies,
                world:    &self.world,
                registry: &self.ctx.perception.registry,
            };
            let mut ctx = TickContext::new(dt, blackboard, &mut host, rng);
            for signal in inbox.drain(..) {
                tree.handle_signal(&signal, &mut ctx)
                    .map_err(|source| SimError::Tree { entity: id, source })?;
            }
            tree.update(&mut ctx)
                .map_err(|source| SimError::Tree { entity: id, source })?;
            if !out.is_empty() {
                effects.push((id, out));
            }
        }

        // ── Phase 4: effects ──────────────────────────────────────────────
        for (id, list) in effects {
            for effect in list {
                self.apply_effect(id, effect);
            }
        }

        // ── Phase 5: steering ─────────────────────────────────────────────
        let scene = Scene { world: &self.world, bodies: &self.bodies };
        let env = SteeringEnv {
            dt,
            collision: &scene,
            paths:     &self.world,
            neighbors: &self.ctx.proximity,
            entities:  &self.bodies,
        };
        for zombie in self.zombies.values_mut() {
            for event in zombie.steering.fixed_update(&env, &mut zombie.rng) {
                match event {
                    SteeringEvent::Arrived { destination } => zombie.inbox.push(Signal::Arrived { destination }),
                }
            }
        }

        // ── Phase 6: integration ──────────────────────────────────────────
        for zombie in self.zombies.values_mut() {
            let body = &mut zombie.steering.body;
            body.integrate(dt);
            if body.kinematic {
                continue;
            }
            let (feet, contacts) = self.world.resolve_overlaps(body.position, body.radius, body.height);
            body.position = feet;
            if let Some(ground) = self.world.support_height(feet) {
                body.rest_on(ground);
            }
            for contact in &contacts {
                zombie.steering.on_collision(contact);
            }
        }
        for survivor in self.survivors.values_mut() {
            survivor.advance(dt);
        }

        // ── Phase 7: melee recovery ───────────────────────────────────────
        //
        // A swing lands when it recovers, on the nearest survivor in reach.
        let melee = &self.zombie_config.melee;
        let mut hits = Vec::new();
        for (&id, zombie) in &mut self.zombies {
            let Some(left) = zombie.melee_timer else {
                continue;
            };
            let left = left - dt;
            if left > 0.0 {
                zombie.melee_timer = Some(left);
                continue;
            }
            zombie.melee_timer = None;
            zombie.inbox.push(Signal::MeleeFinished);
            if let Some(victim) = closest_survivor(&self.survivors, zombie.position(), melee.range) {
                hits.push((victim, id));
            }
        }
        let damage = melee.damage;
        for (victim, attacker) in hits {
            trace!(attacker = %attacker, victim = %victim, "melee hit");
            self.damage(victim, damage, Some(attacker));
            self.summary.melee_hits += 1;
        }

        // ── Phase 8: partition triggers ───────────────────────────────────
        let survivors: Vec<(EntityId, Vec3)> = self.survivors.iter().map(|(&id, s)| (id, s.position())).collect();
        for (id, position) in survivors {
            for event in self.ctx.triggers.update(id, position, &self.ctx.partitions) {
                let repopulation = match event {
                    TriggerEvent::Enter(p) => self.ctx.partitions.report_enter(id, p)?,
                    TriggerEvent::Exit(p) => self.ctx.partitions.report_exit(id, p)?,
                };
                self.apply_repopulation(repopulation);
            }
        }
        let zombies: Vec<(EntityId, Vec3)> = self.zombies.iter().map(|(&id, z)| (id, z.position())).collect();
        for (id, position) in zombies {
            for event in self.ctx.triggers.update(id, position, &self.ctx.partitions) {
                if let TriggerEvent::Enter(p) = event {
                    self.ctx.partitions.ai_entered(id, p)?;
                }
            }
        }

        // ── Phase 9: horde and stalker timers ─────────────────────────────
        self.ctx.horde.update(dt, &self.ctx.partitions);

        // ── Phase 10: spawn ───────────────────────────────────────────────
        //
        // At most one queued request is served per tick.
        if let Some(order) = self.ctx.horde.next_spawn(&self.ctx.partitions) {
            self.spawn_zombie(&order)?;
        }

        // ── Phase 11: fall-through check ──────────────────────────────────
        let every = self.clock.ticks_for_secs(self.zombie_config.kill_y_check_secs).max(1);
        if now.0.is_multiple_of(every) {
            let kill_y = self.zombie_config.kill_y;
            let fallen: Vec<EntityId> = self
                .zombies
                .iter()
                .filter(|(_, z)| z.position().y < kill_y)
                .map(|(&id, _)| id)
                .collect();
            for id in fallen {
                debug!(entity = %id, "zombie fell out of the level");
                self.despawn_zombie(id);
            }
        }

        // ── Phase 12: kill aura ───────────────────────────────────────────
        if let Some(timer) = self.kill_aura {
            let timer = timer - dt;
            if timer <= 0.0 {
                self.kill_aura = Some(timer + KILL_AURA_PERIOD);
                self.kill_aura_pulse();
            } else {
                self.kill_aura = Some(timer);
            }
        }

        self.summary.zombies_alive = self.zombies.len();
        self.summary.aggroed = self.ctx.perception.aggroed_count();
        self.summary.queued_spawns = self.ctx.horde.queue().len();
        self.summary.horde_active = self.ctx.horde.is_horde_active();
        Ok(self.summary.clone())
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn allocate_id(&mut self) -> SimResult<EntityId> {
        let id = EntityId(self.next_entity);
        self.next_entity = self
            .next_entity
            .checked_add(1)
            .filter(|&next| EntityId(next) != EntityId::INVALID)
            .ok_or_else(|| SimError::Config("entity ids exhausted".into()))?;
        Ok(id)
    }

    fn handle_death(&mut self, id: EntityId, death: DeathEvent, horde_active: bool) {
        if self.zombies.contains_key(&id) {
            debug!(entity = %id, killer = ?death.instigator, "zombie died");
            self.ctx.partitions.report_ai_death(id, horde_active);
            self.ctx.horde.report_ai_death(id);
            if let (Some(origin), Some(range)) = (
                self.bodies.get(id).map(|p| p.position),
                self.ctx.perception.aggro(id).map(|a| a.config.forwarding_range),
            ) {
                for witness in self.ctx.proximity.within(origin, range) {
                    if witness != id {
                        self.ctx.perception.on_death_notice(witness, &self.bodies);
                    }
                }
            }
            self.remove_zombie(id);
            self.summary.zombie_deaths += 1;
        } else if self.remove_survivor(id) {
            info!(entity = %id, killer = ?death.instigator, "survivor died");
        }
    }

    fn apply_effect(&mut self, id: EntityId, effect: AgentEffect) {
        match effect {
            AgentEffect::MeleeSwing => {
                let recover = self.zombie_config.melee.recover_time;
                if let Some(zombie) = self.zombies.get_mut(&id) {
                    zombie.melee_timer = Some(recover);
                }
            }
            AgentEffect::MeleeCancel => {
                if let Some(zombie) = self.zombies.get_mut(&id) {
                    zombie.melee_timer = None;
                }
            }
            AgentEffect::Shot(shot) => {
                debug!(entity = %id, target = ?shot.target, shots = shot.num_shots, "shoot");
                self.summary.shots += usize::try_from(shot.num_shots).unwrap_or(0);
            }
            AgentEffect::Event { target: None, name } => {
                if let Some(zombie) = self.zombies.get_mut(&id) {
                    zombie.inbox.push(Signal::impulse(name));
                }
            }
            AgentEffect::Event { target: Some(source), name } => {
                trace!(entity = %id, source = %source, event = %name, "named event");
                self.raise_event(Some(&source), &name);
            }
        }
    }

    fn apply_repopulation(&mut self, repopulation: Repopulation) {
        for id in repopulation.despawn {
            self.despawn_zombie(id);
        }
        self.ctx.horde.queue_spawns(repopulation.requests);
    }

    fn force_aggro(&mut self, zombie: EntityId, target: EntityId) -> SimResult<()> {
        let was_aggroed = self.ctx.perception.aggro(zombie).is_some_and(|a| a.is_aggroed());
        let Some(change) = self.ctx.perception.force_target(zombie, target, &self.bodies) else {
            return Ok(());
        };
        if let AggroEffect::Targeted { target } = change.effect {
            self.write_target(zombie, target)?;
        }
        if !was_aggroed {
            self.mark_aggroed(zombie, true)?;
        }
        Ok(())
    }

    /// Aggro picked `target`: point the tree at it.  Losing aggro leaves the
    /// slot alone so the tree keeps chasing the last known quarry.
    fn write_target(&mut self, id: EntityId, target: EntityId) -> SimResult<()> {
        let Some(zombie) = self.zombies.get_mut(&id) else {
            return Ok(());
        };
        zombie.blackboard.set(&self.zombie_config.aggro.bb_target_key, target)?;
        Ok(())
    }

    fn mark_aggroed(&mut self, id: EntityId, aggroed: bool) -> SimResult<()> {
        let Some(zombie) = self.zombies.get_mut(&id) else {
            return Ok(());
        };
        zombie.blackboard.set(AGGROED_KEY, i32::from(aggroed))?;
        zombie.presentation.color = if aggroed { Color::RED } else { Color::WHITE };
        Ok(())
    }

    fn kill_aura_pulse(&mut self) {
        let Some(player) = closest_survivor(&self.survivors, Vec3::ZERO, f32::INFINITY) else {
            return;
        };
        let Some(centre) = self.survivors.get(&player).map(Survivor::position) else {
            return;
        };
        let victims: Vec<EntityId> = self
            .zombies
            .iter()
            .filter(|(_, z)| dist_sqr(z.position(), centre) <= KILL_AURA_RANGE * KILL_AURA_RANGE)
            .map(|(&id, _)| id)
            .collect();
        for victim in victims {
            self.damage(victim, KILL_AURA_DAMAGE, Some(player));
        }
    }
}

fn pose_of(body: &Body) -> Pose {
    Pose { position: body.position, forward: body.forward, height: body.height }
}

/// Survivor nearest `point` within `range`.  Ties keep the lower id.
fn closest_survivor(survivors: &BTreeMap<EntityId, Survivor>, point: Vec3, range: f32) -> Option<EntityId> {
    let limit = range * range;
    let mut best: Option<(EntityId, f32)> = None;
    for (&id, survivor) in survivors {
        let d2 = dist_sqr(survivor.position(), point);
        if d2 <= limit && best.is_none_or(|(_, best_d2)| d2 < best_d2) {
            best = Some((id, d2));
        }
    }
    best.map(|(id, _)| id)
}
