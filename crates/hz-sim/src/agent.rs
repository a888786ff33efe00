//! Per-entity state the simulation owns, and the [`AgentActions`] host a
//! zombie's tree drives.
//!
//! | Type        | Role                                                      |
//! |-------------|-----------------------------------------------------------|
//! | `Zombie`    | steering + tree + blackboard + presentation + melee timer |
//! | `Survivor`  | a kinematic body walking a fixed route                    |
//! | `Health`    | hit points shared by both factions                        |
//! | `AgentHost` | borrows one zombie's parts for a single tree update       |

use rustc_hash::FxHashMap;
use tracing::trace;

use hz_behavior::{AgentActions, AnimParam, BehaviorTree, Blackboard, ShotRequest, Signal};
use hz_core::math::flatten;
use hz_core::{AgentRng, Color, EntityId, EntityLocator, Vec3, ZombieType};
use hz_perception::{AggroConfig, DamageEvent, SensableRegistry, SensingConfig};
use hz_steering::{Body, CollisionQuery, PathProvider, SteeringConfig, SteeringController};

use crate::world::{Bodies, FlatWorld};

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MeleeConfig {
    pub damage:       f32,
    /// Reach from the attacker's feet.
    pub range:        f32,
    /// Seconds from swing to `MeleeFinished`.
    pub recover_time: f32,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self { damage: 1.0, range: 2.0, recover_time: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ZombieConfig {
    pub steering:           SteeringConfig,
    pub sensing:            SensingConfig,
    pub aggro:              AggroConfig,
    pub max_health:         f32,
    pub melee:              MeleeConfig,
    /// Stalkers hold on to their quarry practically forever.
    pub stalker_aggro_time: f32,
    /// Zombies below this height are removed.
    pub kill_y:             f32,
    pub kill_y_check_secs:  f32,
    /// Reported by `anim_state_length`.
    pub anim_state_secs:    f32,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            steering:           SteeringConfig::default(),
            sensing:            SensingConfig::default(),
            aggro:              AggroConfig::default(),
            max_health:         3.0,
            melee:              MeleeConfig::default(),
            stalker_aggro_time: 9_000.0,
            kill_y:             -100.0,
            kill_y_check_secs:  5.0,
            anim_state_secs:    1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SurvivorConfig {
    pub max_health: f32,
    pub walk_speed: f32,
    /// Sensable priority; zombies switch to higher-priority targets.
    pub priority:   f32,
}

impl Default for SurvivorConfig {
    fn default() -> Self {
        Self { max_health: 100.0, walk_speed: 3.0, priority: 0.0 }
    }
}

// ── Health ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Health {
    pub max:       f32,
    pub current:   f32,
    pub killed_by: Option<EntityId>,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { max, current: max, killed_by: None }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Apply one hit.  Returns `true` on the hit that kills; hits on the dead
    /// are ignored.
    pub fn apply(&mut self, hit: &DamageEvent) -> bool {
        if self.is_dead() {
            return false;
        }
        self.current -= hit.amount;
        if self.current > 0.0 {
            return false;
        }
        self.current = 0.0;
        self.killed_by = hit.instigator;
        true
    }
}

// ── Zombie ────────────────────────────────────────────────────────────────────

/// What a renderer would show.  Kept so scripted trees can be observed.
#[derive(Clone, Debug, Default)]
pub struct Presentation {
    pub color:           Color,
    pub anim:            FxHashMap<String, AnimParam>,
    pub anim_state_secs: f32,
}

pub struct Zombie {
    pub zombie_type:  ZombieType,
    pub steering:     SteeringController,
    pub tree:         BehaviorTree,
    pub blackboard:   Blackboard,
    pub rng:          AgentRng,
    pub presentation: Presentation,
    /// Seconds until the current swing recovers.
    pub melee_timer:  Option<f32>,
    /// Signals delivered before the next tree update.
    pub inbox:        Vec<Signal>,
}

impl Zombie {
    pub fn position(&self) -> Vec3 {
        self.steering.body.position
    }
}

/// Side effects a tree asks for that reach beyond its own agent.  The sim
/// applies them after every tree has run.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEffect {
    MeleeSwing,
    MeleeCancel,
    Shot(ShotRequest),
    Event { target: Option<String>, name: String },
}

pub struct AgentHost<'a> {
    pub steering:     &'a mut SteeringController,
    pub presentation: &'a mut Presentation,
    pub effects:      &'a mut Vec<AgentEffect>,
    pub bodies:       &'a Bodies,
    pub world:        &'a FlatWorld,
    pub registry:     &'a SensableRegistry,
}

impl AgentActions for AgentHost<'_> {
    fn steering(&self) -> &SteeringController {
        &*self.steering
    }

    fn steering_mut(&mut self) -> &mut SteeringController {
        &mut *self.steering
    }

    fn entities(&self) -> &dyn EntityLocator {
        self.bodies
    }

    fn head_offset(&self, entity: EntityId) -> Option<Vec3> {
        self.registry.get(entity).map(|s| s.head_offset)
    }

    fn is_blocked(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> bool {
        self.world.raycast(origin, dir, max_dist, None).is_some()
    }

    fn sample_walkable(&self, near: Vec3, max_dist: f32) -> Option<Vec3> {
        self.world.sample_position(near, max_dist)
    }

    fn set_anim_param(&mut self, name: &str, value: AnimParam) {
        self.presentation.anim.insert(name.to_owned(), value);
    }

    fn anim_state_length(&self) -> f32 {
        self.presentation.anim_state_secs
    }

    fn melee_swing(&mut self) {
        self.effects.push(AgentEffect::MeleeSwing);
    }

    fn melee_cancel(&mut self) {
        self.effects.push(AgentEffect::MeleeCancel);
    }

    fn shoot(&mut self, shot: ShotRequest) {
        self.effects.push(AgentEffect::Shot(shot));
    }

    fn play_sound(&mut self, path: &str, at: Vec3) {
        trace!(entity = %self.steering.entity(), path, ?at, "sound");
    }

    fn send_event(&mut self, target: Option<&str>, event: &str) {
        self.effects.push(AgentEffect::Event {
            target: target.map(str::to_owned),
            name:   event.to_owned(),
        });
    }

    fn set_color(&mut self, color: Color) {
        self.presentation.color = color;
    }
}

// ── Survivor ──────────────────────────────────────────────────────────────────

/// Where a survivor starts and the loop it walks.
#[derive(Clone, Debug, PartialEq)]
pub struct SurvivorSpawn {
    pub start: Vec3,
    pub route: Vec<Vec3>,
}

impl SurvivorSpawn {
    pub fn standing(start: Vec3) -> Self {
        Self { start, route: Vec::new() }
    }

    pub fn walking(start: Vec3, route: Vec<Vec3>) -> Self {
        Self { start, route }
    }
}

/// A scripted stand-in for a player: walks its route in a loop.
#[derive(Clone, Debug)]
pub struct Survivor {
    pub body:  Body,
    pub route: Vec<Vec3>,
    next:      usize,
    pub speed: f32,
}

impl Survivor {
    pub fn new(start: Vec3, route: Vec<Vec3>, speed: f32) -> Self {
        let mut body = Body::new(start);
        body.kinematic = true;
        Self { body, route, next: 0, speed }
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn next_waypoint(&self) -> Option<Vec3> {
        self.route.get(self.next).copied()
    }

    /// Walk toward the current waypoint; on reaching it, aim for the next.
    pub fn advance(&mut self, dt: f32) {
        let Some(goal) = self.next_waypoint() else {
            return;
        };
        let to_goal = goal - self.body.position;
        let step = self.speed * dt;
        if to_goal.length() <= step {
            self.body.position = goal;
            self.next = (self.next + 1) % self.route.len();
        } else {
            self.body.position += to_goal.normalize_or_zero() * step;
        }
        let facing = flatten(to_goal).normalize_or_zero();
        if facing != Vec3::ZERO {
            self.body.forward = facing;
        }
    }

    pub fn teleport(&mut self, position: Vec3) {
        self.body.teleport(position);
        self.next = 0;
    }
}
