//! The perception subsystem as one unit: registry, every senser, every aggro.
//!
//! # Tick order
//!
//! ```text
//! 1. each due senser (id order): sight + near sense → resolve → delta
//! 2. each delta: lost → Aggro::on_lost, then gained → Aggro::on_detected
//! 3. group alerts raised in step 2 are delivered (after all sensers ran)
//! 4. each aggro: grace timer update
//! ```
//!
//! Alerts raised during a pass land in the receivers' pending sets and take
//! effect at their next resolution, never mid-pass.

use std::collections::BTreeMap;

use hz_core::math::dist_sqr;
use hz_core::{AgentRng, EntityId, EntityLocator, EventChannel, Faction, Vec3};
use tracing::trace;

use crate::{
    Aggro, AggroConfig, AggroEffect, AggroLostEvent, AggroTriggeredEvent, PerceptionError,
    PerceptionResult, Sensable, SensableRegistry, SenseWorld, Sensing, SensingConfig,
};

/// Seed offset separating sensing throttles from an entity's other streams.
const SENSING_STREAM: u64 = 0x5e45_1e55;

/// One aggro transition, tagged with whose it was.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AggroChange {
    pub entity: EntityId,
    pub effect: AggroEffect,
}

struct Alert {
    origin:  Vec3,
    target:  EntityId,
    range:   f32,
    faction: Faction,
}

pub struct Perception {
    pub registry:        SensableRegistry,
    sensers:             BTreeMap<EntityId, Sensing>,
    aggro:               BTreeMap<EntityId, Aggro>,
    pub aggro_triggered: EventChannel<AggroTriggeredEvent>,
    pub aggro_lost:      EventChannel<AggroLostEvent>,
    seed:                u64,
}

impl Perception {
    pub fn new(seed: u64) -> Self {
        Self {
            registry:        SensableRegistry::new(),
            sensers:         BTreeMap::new(),
            aggro:           BTreeMap::new(),
            aggro_triggered: EventChannel::new(),
            aggro_lost:      EventChannel::new(),
            seed,
        }
    }

    // ── Registration ──────────────────────────────────────────────────────

    pub fn add_sensable(&mut self, entity: EntityId, sensable: Sensable) {
        self.registry.register(entity, sensable);
    }

    /// Give `entity` a senser.  It must already be sensable.
    pub fn add_sensing(&mut self, entity: EntityId, config: SensingConfig) -> PerceptionResult<()> {
        if !self.registry.contains(entity) {
            return Err(PerceptionError::NotSensable(entity));
        }
        let rng = AgentRng::new(self.seed ^ SENSING_STREAM, entity);
        self.sensers.insert(entity, Sensing::new(config, rng));
        Ok(())
    }

    /// Give `entity` aggro.  It must already have a senser.
    pub fn add_aggro(&mut self, entity: EntityId, config: AggroConfig) -> PerceptionResult<()> {
        if !self.sensers.contains_key(&entity) {
            return Err(PerceptionError::NoSensing(entity));
        }
        self.aggro.insert(entity, Aggro::new(config));
        self.aggro_triggered.subscribe(entity);
        self.aggro_lost.subscribe(entity);
        Ok(())
    }

    /// Drop every trace of `entity`.  Sensers still detecting it lose it at
    /// their next resolution.
    pub fn remove(&mut self, entity: EntityId) {
        self.registry.unregister(entity);
        self.sensers.remove(&entity);
        self.aggro.remove(&entity);
        self.aggro_triggered.unsubscribe(entity);
        self.aggro_lost.unsubscribe(entity);
    }

    /// Level teardown.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.sensers.clear();
        self.aggro.clear();
        self.aggro_triggered.clear();
        self.aggro_lost.clear();
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn sensing(&self, entity: EntityId) -> Option<&Sensing> {
        self.sensers.get(&entity)
    }

    pub fn sensing_mut(&mut self, entity: EntityId) -> Option<&mut Sensing> {
        self.sensers.get_mut(&entity)
    }

    pub fn aggro(&self, entity: EntityId) -> Option<&Aggro> {
        self.aggro.get(&entity)
    }

    pub fn aggro_mut(&mut self, entity: EntityId) -> Option<&mut Aggro> {
        self.aggro.get_mut(&entity)
    }

    pub fn sensers(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.sensers.keys().copied()
    }

    pub fn aggroed_count(&self) -> usize {
        self.aggro.values().filter(|a| a.is_aggroed()).count()
    }

    /// Override how long `entity` stays aggroed out of sight.
    pub fn set_aggro_time(&mut self, entity: EntityId, secs: f32) {
        if let Some(aggro) = self.aggro.get_mut(&entity) {
            aggro.config.aggro_time = secs;
        }
    }

    // ── External reports ──────────────────────────────────────────────────

    /// A noise made by `target` at `origin`: every senser other than the
    /// target within `range` detects it.
    pub fn report_hearing_event(
        &mut self,
        target:   EntityId,
        range:    f32,
        origin:   Vec3,
        entities: &dyn EntityLocator,
    ) -> usize {
        self.inject_where(target, range, origin, entities, |_| true)
    }

    /// Like hearing, but only sensers of `faction` receive it.
    pub fn report_group_sense_event(
        &mut self,
        target:   EntityId,
        range:    f32,
        origin:   Vec3,
        faction:  Faction,
        entities: &dyn EntityLocator,
    ) -> usize {
        let factions: BTreeMap<EntityId, Faction> = self
            .sensers
            .keys()
            .filter_map(|&e| self.registry.get(e).map(|s| (e, s.faction)))
            .collect();
        self.inject_where(target, range, origin, entities, |e| factions.get(&e) == Some(&faction))
    }

    fn inject_where(
        &mut self,
        target:   EntityId,
        range:    f32,
        origin:   Vec3,
        entities: &dyn EntityLocator,
        accept:   impl Fn(EntityId) -> bool,
    ) -> usize {
        let range_sqr = range * range;
        let mut reached = 0;
        for (&senser, sensing) in &mut self.sensers {
            if senser == target || !accept(senser) {
                continue;
            }
            let Some(pos) = entities.position(senser) else {
                continue;
            };
            if dist_sqr(pos, origin) < range_sqr {
                sensing.inject(target);
                reached += 1;
            }
        }
        reached
    }

    /// `entity` took damage: it assumes the nearest opposing entity did it.
    pub fn on_damaged(&mut self, entity: EntityId, entities: &dyn EntityLocator) {
        self.blame_closest(entity, entities);
    }

    /// `entity` was told of a death (its own or another's) and looks for the
    /// nearest opposing entity.
    pub fn on_death_notice(&mut self, entity: EntityId, entities: &dyn EntityLocator) {
        self.blame_closest(entity, entities);
    }

    fn blame_closest(&mut self, entity: EntityId, entities: &dyn EntityLocator) {
        let (Some(own), Some(pos)) = (self.registry.get(entity), entities.position(entity)) else {
            return;
        };
        let culprit = self.registry.closest_with_faction(own.faction.opposing(), pos, entities);
        if let (Some(culprit), Some(sensing)) = (culprit, self.sensers.get_mut(&entity)) {
            sensing.inject(culprit);
        }
    }

    /// Lock `entity` on to `target` directly, as horde orders and stalker
    /// spawns do.  Alerts teammates like a normal acquisition.
    pub fn force_target(
        &mut self,
        entity:   EntityId,
        target:   EntityId,
        entities: &dyn EntityLocator,
    ) -> Option<AggroChange> {
        let (aggro, sensing) = (self.aggro.get_mut(&entity)?, self.sensers.get_mut(&entity)?);
        let effect = aggro.set_target(target, sensing);
        if let Some(alert) = self.alert_for(entity, target, entities) {
            self.deliver(&[alert], entities);
        }
        Some(AggroChange { entity, effect })
    }

    fn alert_for(&self, entity: EntityId, target: EntityId, entities: &dyn EntityLocator) -> Option<Alert> {
        let config = &self.aggro.get(&entity)?.config;
        if !config.forwards_to_teammates {
            return None;
        }
        Some(Alert {
            origin:  entities.position(entity)?,
            target,
            range:   config.forwarding_range,
            faction: self.registry.get(entity)?.faction,
        })
    }

    fn deliver(&mut self, alerts: &[Alert], entities: &dyn EntityLocator) {
        for alert in alerts {
            self.report_group_sense_event(alert.target, alert.range, alert.origin, alert.faction, entities);
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// One perception pass.  Returns every aggro transition in entity order.
    pub fn tick(&mut self, dt: f32, horde_active: bool, world: SenseWorld<'_>) -> Vec<AggroChange> {
        let mut changes = Vec::new();
        let mut alerts = Vec::new();

        for (&entity, sensing) in &mut self.sensers {
            if !sensing.tick_due() {
                continue;
            }
            let Some(own) = self.registry.get(entity).copied() else {
                continue;
            };
            sensing.sense(entity, &own, &self.registry, world);
            let delta = sensing.resolve();
            if delta.is_empty() {
                continue;
            }
            trace!(entity = %entity, lost = delta.lost.len(), gained = delta.gained.len(), "detections resolved");

            let Some(aggro) = self.aggro.get_mut(&entity) else {
                continue;
            };
            for &lost in &delta.lost {
                aggro.on_lost(lost);
            }
            for &gained in &delta.gained {
                for effect in aggro.on_detected(own.faction, gained, &self.registry, sensing) {
                    if let AggroEffect::Targeted { target } = effect {
                        if aggro.config.forwards_to_teammates {
                            if let Some(origin) = world.entities.position(entity) {
                                alerts.push(Alert {
                                    origin,
                                    target,
                                    range: aggro.config.forwarding_range,
                                    faction: own.faction,
                                });
                            }
                        }
                    }
                    changes.push(AggroChange { entity, effect });
                }
            }
        }

        self.deliver(&alerts, world.entities);

        for (&entity, aggro) in &mut self.aggro {
            let Some(sensing) = self.sensers.get_mut(&entity) else {
                continue;
            };
            if let Some(effect) = aggro.update(dt, horde_active, sensing) {
                changes.push(AggroChange { entity, effect });
            }
        }

        for change in &changes {
            match change.effect {
                AggroEffect::Triggered { target } => {
                    self.aggro_triggered.publish(change.entity, AggroTriggeredEvent { target });
                }
                AggroEffect::Lost { target } => {
                    self.aggro_lost.publish(change.entity, AggroLostEvent { target });
                }
                AggroEffect::Targeted { .. } => {}
            }
        }
        changes
    }
}
