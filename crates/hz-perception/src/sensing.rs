//! Per-entity detection: a forward sight cone plus an all-round near sense.
//!
//! Sensing is throttled.  Between updates, detections reported from outside
//! (hearing, group alerts, damage) pile up in the pending set and are folded
//! in at the next resolution.

use std::collections::BTreeSet;
use std::f32::consts::PI;

use hz_core::math::dist_sqr;
use hz_core::{AgentRng, EntityId, EntityLocator, Faction, Vec3};
use hz_steering::CollisionQuery;

use crate::{Sensable, SensableRegistry};

/// Read-only world access for one perception pass.
#[derive(Copy, Clone)]
pub struct SenseWorld<'a> {
    pub entities:  &'a dyn EntityLocator,
    pub collision: &'a dyn CollisionQuery,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensingConfig {
    /// Anything of a searched faction this close is sensed regardless of
    /// facing or occlusion.
    pub near_sense_radius:  f32,
    pub view_cone_length:   f32,
    /// Full cone angle in degrees.
    pub view_cone_angle:    f32,
    pub detects_enemies:    bool,
    pub detects_friendlies: bool,
    /// Ticks between updates are drawn from `[lo, hi)`.
    pub update_ticks:       (i32, i32),
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            near_sense_radius:  2.0,
            view_cone_length:   7.0,
            view_cone_angle:    90.0,
            detects_enemies:    true,
            detects_friendlies: false,
            update_ticks:       (8, 12),
        }
    }
}

impl SensingConfig {
    /// Factions searched by a senser belonging to `own`.
    pub fn factions_to_search(&self, own: Faction) -> Vec<Faction> {
        let mut out = Vec::with_capacity(2);
        if self.detects_enemies {
            out.extend(Faction::ALL.into_iter().filter(|f| own.is_enemy_of(*f)));
        }
        if self.detects_friendlies {
            out.push(own);
        }
        out
    }
}

/// What changed in one resolution.  `lost` and `gained` are disjoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionDelta {
    pub lost:   Vec<EntityId>,
    pub gained: Vec<EntityId>,
}

impl DetectionDelta {
    pub fn is_empty(&self) -> bool {
        self.lost.is_empty() && self.gained.is_empty()
    }
}

// ── Sensing ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Sensing {
    /// Live reach.  Aggro scales the cone length and angle in place.
    pub config:  SensingConfig,
    detected:    BTreeSet<EntityId>,
    pending:     BTreeSet<EntityId>,
    ticks_until: i32,
    rng:         AgentRng,
}

impl Sensing {
    pub fn new(config: SensingConfig, rng: AgentRng) -> Self {
        Self {
            config,
            detected:    BTreeSet::new(),
            pending:     BTreeSet::new(),
            ticks_until: 0,
            rng,
        }
    }

    /// Everything detected as of the last resolution.
    pub fn detected(&self) -> &BTreeSet<EntityId> {
        &self.detected
    }

    #[inline]
    pub fn is_detecting(&self, entity: EntityId) -> bool {
        self.detected.contains(&entity)
    }

    /// Detections reported since the last resolution.
    pub fn pending(&self) -> &BTreeSet<EntityId> {
        &self.pending
    }

    /// Report `entity` as detected; it takes effect at the next resolution.
    pub fn inject(&mut self, entity: EntityId) {
        self.pending.insert(entity);
    }

    /// Forget `entity` everywhere without raising a lost event.
    pub fn forget(&mut self, entity: EntityId) {
        self.detected.remove(&entity);
        self.pending.remove(&entity);
    }

    /// Multiply the cone length by `length` and the angle by `angle`.
    pub fn scale_reach(&mut self, length: f32, angle: f32) {
        self.config.view_cone_length *= length;
        self.config.view_cone_angle *= angle;
    }

    /// Count down the throttle.  `true` when this tick should sense.
    pub fn tick_due(&mut self) -> bool {
        if self.ticks_until > 0 {
            self.ticks_until -= 1;
            return false;
        }
        let (lo, hi) = self.config.update_ticks;
        self.ticks_until = self.rng.range_i32(lo, hi);
        true
    }

    /// Run sight and near sense for `me`, adding hits to the pending set.
    pub fn sense(&mut self, me: EntityId, own: &Sensable, registry: &SensableRegistry, world: SenseWorld<'_>) {
        let Some(my_pos) = world.entities.position(me) else {
            return;
        };
        let forward = world.entities.forward(me).unwrap_or(Vec3::Z);
        let eye = my_pos + own.head_offset;
        let half_angle = self.config.view_cone_angle * PI / 360.0;
        let near_sqr = self.config.near_sense_radius * self.config.near_sense_radius;

        for faction in self.config.factions_to_search(own.faction) {
            for target in registry.members(faction) {
                if target == me {
                    continue;
                }
                let Some(target_pos) = world.entities.position(target) else {
                    continue;
                };
                let head = registry.get(target).map_or(Vec3::ZERO, |s| s.head_offset);

                if self.can_see(me, eye, forward, half_angle, target, target_pos + head, world) {
                    self.pending.insert(target);
                }
                if dist_sqr(target_pos, my_pos) <= near_sqr {
                    self.pending.insert(target);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn can_see(
        &self,
        me:         EntityId,
        eye:        Vec3,
        forward:    Vec3,
        half_angle: f32,
        target:     EntityId,
        target_eye: Vec3,
        world:      SenseWorld<'_>,
    ) -> bool {
        let Some(towards) = (target_eye - eye).try_normalize() else {
            return false;
        };
        let angle = towards.dot(forward).clamp(-1.0, 1.0).acos();
        if angle >= half_angle {
            return false;
        }
        world
            .collision
            .raycast(eye, towards, self.config.view_cone_length, Some(me))
            .is_some_and(|hit| hit.entity == Some(target))
    }

    /// Fold the pending set into the detected set and report the change.
    pub fn resolve(&mut self) -> DetectionDelta {
        let frame = std::mem::take(&mut self.pending);
        let lost: Vec<EntityId> = self.detected.difference(&frame).copied().collect();
        let gained: Vec<EntityId> = frame.difference(&self.detected).copied().collect();
        self.detected = frame;
        DetectionDelta { lost, gained }
    }
}
