//! Leaves: single actions on the owner.
//!
//! Leaves touch nothing but their own node and the [`TickContext`], so they
//! are plain functions over `&mut Node` rather than tree methods.  A leaf
//! that is no longer running just reports its status when updated.

use hz_core::math::{dist_sqr, jump_velocity};
use hz_core::{Color, Vec3};
use hz_steering::{LookMode, OrientTarget, SteeringController, WanderTuning};
use tracing::{debug, info};

use crate::actions::{AnimParam, ArcShot, ShotRequest};
use crate::field::{field_enum, node_params};
use crate::{BbValue, BehaviorError, BehaviorResult, Node, NodeKind, NodeStatus, Signal, TickContext};

/// Seconds between `MoveToNavMesh` re-jumps, before jitter.
pub const NAVMESH_RUN_TIME: f32 = 2.0;
pub const NAVMESH_RUN_RANDOM: f32 = 0.5;
/// How far `MoveToNavMesh` searches for walkable ground.
pub const NAVMESH_SAMPLE_DIST: f32 = 8.0;
/// `MoveRandomly` probe attempts and probe length.
pub const RANDOM_MOVE_ATTEMPTS: u32 = 5;
pub const RANDOM_MOVE_PROBE: f32 = 2.0;
/// `SteerTo` re-reads its target every `[min, max)` ticks.
pub const RETARGET_TICKS: (i32, i32) = (8, 16);

field_enum! {
    pub enum ParamType {
        #[default]
        Bool,
        Float,
        Int,
        Trigger,
    }
}

field_enum! {
    /// What `SetOrientTowardsParameters` points the owner's facing at.
    pub enum OrientType {
        Position,
        Entity,
        Velocity,
        #[default]
        Unoriented,
    }
}

node_params! {
    pub struct Melee {}
}

node_params! {
    pub struct Shoot {
        bb_target_key:      String = "BBTargetKey"      => "Target".to_owned(),
        bb_projectile_key:  String = "BBProjectileKey"  => String::new(),
        spread:             f32    = "Spread"           => 60.0,
        num_shots:          i32    = "NumShots"         => 1,
        destroy_after_time: f32    = "DestroyAfterTime" => 5.0,
        use_arc:            bool   = "UseArc"           => false,
        peak_height_offset: f32    = "PeakHeightOffset" => 5.0,
        peak_random:        f32    = "PeakRandom"       => 3.0,
    }
}

node_params! {
    pub struct MoveTo {
        target_bb_key: String = "TargetBBKey" => String::new(),
        /// Ground acceleration while moving; zero keeps the current setting.
        move_speed:    f32    = "MoveSpeed"   => 0.0,
    }
}

node_params! {
    pub struct MoveToNavMesh {}
}

node_params! {
    pub struct SetAnimParam {
        param_name: String    = "ParamName" => String::new(),
        param_type: ParamType = "ParamType" => ParamType::Bool,
        bool_val:   bool      = "BoolVal"   => false,
        float_val:  f32       = "FloatVal"  => 0.0,
        int_val:    i32       = "IntVal"    => 0,
    }
}

node_params! {
    /// `SetAnimParam` that stays running for the length of the animation
    /// state it lands in.
    pub struct PlayAnim {
        param_name: String    = "ParamName" => String::new(),
        param_type: ParamType = "ParamType" => ParamType::Bool,
        bool_val:   bool      = "BoolVal"   => false,
        float_val:  f32       = "FloatVal"  => 0.0,
        int_val:    i32       = "IntVal"    => 0,
    }
}

node_params! {
    pub struct Idle {
        idle_time:        f32 = "IdleTime"       => 3.0,
        idle_time_random: f32 = "IdleTimeRandom" => 1.0,
    }
}

node_params! {
    pub struct MoveRandomly {
        fail_if_directionless:   bool = "FailIfDirectionless"  => false,
        time_spent_moving:       f32  = "TimeSpentMoving"      => 1.0,
        time_spent_moving_rand:  f32  = "TimeSpentMovingRand"  => 0.25,
    }
}

node_params! {
    pub struct SendEvent {
        event_name:  String = "EventName"  => String::new(),
        /// Named object to raise the event on; empty for the owner.
        target_name: String = "TargetName" => String::new(),
    }
}

node_params! {
    pub struct PlaySound {
        sound_path: String = "SoundPath" => String::new(),
    }
}

node_params! {
    pub struct DebugMessage {
        message:         String = "Message"      => String::new(),
        bb_key_to_print: String = "BBKeyToPrint" => String::new(),
    }
}

node_params! {
    pub struct Jump {
        jump_velocity: f32 = "JumpVelocity" => 4.0,
    }
}

node_params! {
    pub struct Brake {}
}

node_params! {
    pub struct SetSteeringParameters {
        look_mode:  LookMode = "LookMode"  => LookMode::Unoriented,
        turn_speed: f32      = "TurnSpeed" => 360.0,
        move_speed: f32      = "MoveSpeed" => 25.0,
        max_speed:  f32      = "MaxSpeed"  => 6.0,
    }
}

node_params! {
    pub struct SetOrientTowardsParameters {
        target_blackboard_key: String     = "TargetBlackboardKey" => String::new(),
        orient_type:           OrientType = "OrientType"          => OrientType::Unoriented,
        turn_speed:            f32        = "TurnSpeed"           => 90.0,
        x_locked:              bool       = "XLocked"             => false,
        y_locked:              bool       = "YLocked"             => false,
        z_locked:              bool       = "ZLocked"             => false,
    }
}

node_params! {
    /// Full steering setup plus a destination that tracks a blackboard key.
    pub struct SteerTo {
        look_mode:             LookMode = "LookMode"            => LookMode::AlongPath,
        target_bb_key:         String   = "TargetBBKey"         => String::new(),
        turn_speed:            f32      = "TurnSpeed"           => 360.0,
        move_speed:            f32      = "MoveSpeed"           => 25.0,
        max_speed:             f32      = "MaxSpeed"            => 6.0,
        near_dist:             f32      = "NearDist"            => 1.0,
        avoidance_distance:    f32      = "AvoidanceDistance"   => 8.0,
        avoidance_spread:      f32      = "AvoidanceSpread"     => 5.0,
        avoidance_insta_vel:   f32      = "AvoidanceInstaVel"   => 0.1,
        num_avoidance_feelers: i32      = "NumAvoidanceFeelers" => 1,
        wander_distance:       f32      = "WanderDistance"      => 1.0,
        wander_radius:         f32      = "WanderRadius"        => 1.0,
        wander_jitter:         f32      = "WanderJitter"        => 20.0,
        avoidance_weight:      f32      = "AvoidanceWeight"     => 0.1,
        pathing_weight:        f32      = "PathingWeight"       => 1.0,
        separation_weight:     f32      = "SeparationWeight"    => 0.0,
        braking_weight:        f32      = "BrakingWeight"       => 0.3,
        wander_weight:         f32      = "WanderWeight"        => 0.1,
        run_at_weight:         f32      = "RunAtWeight"         => 0.0,
    }
}

node_params! {
    pub struct ChangeColor {
        to_change_to: Color = "ToChangeTo" => Color::MAGENTA,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn anim_value(param_type: ParamType, bool_val: bool, float_val: f32, int_val: i32) -> AnimParam {
    match param_type {
        ParamType::Bool    => AnimParam::Bool(bool_val),
        ParamType::Float   => AnimParam::Float(float_val),
        ParamType::Int     => AnimParam::Int(int_val),
        ParamType::Trigger => AnimParam::Trigger,
    }
}

impl SetSteeringParameters {
    fn apply(&self, steering: &mut SteeringController) {
        steering.set_look_mode(self.look_mode);
        steering.orient.turn_speed = self.turn_speed;
        steering.config.move_speed = self.move_speed;
        steering.config.max_speed = self.max_speed;
    }
}

impl SteerTo {
    fn apply(&self, steering: &mut SteeringController) {
        steering.set_look_mode(self.look_mode);
        steering.orient.turn_speed = self.turn_speed;

        let config = &mut steering.config;
        config.move_speed = self.move_speed;
        config.max_speed = self.max_speed;
        config.near_dist = self.near_dist;
        config.wander = WanderTuning {
            distance: self.wander_distance,
            radius:   self.wander_radius,
            jitter:   self.wander_jitter,
        };
        config.avoidance.distance = self.avoidance_distance;
        config.avoidance.spread = self.avoidance_spread;
        config.avoidance.insta_vel = self.avoidance_insta_vel;
        config.avoidance.feelers = self.num_avoidance_feelers.max(0) as u32;

        let weights = &mut config.weights;
        weights.avoidance = self.avoidance_weight;
        weights.pathing = self.pathing_weight;
        weights.separation = self.separation_weight;
        weights.braking = self.braking_weight;
        weights.wander = self.wander_weight;
        weights.run_at = self.run_at_weight;
    }

    /// Point steering (and facing) at the current blackboard target.
    /// Returns `false` when there is nothing to steer to.
    fn retarget(&self, ctx: &mut TickContext<'_>) -> BehaviorResult<bool> {
        match ctx.blackboard.get(&self.target_bb_key)? {
            BbValue::Vec3(pos) => {
                let pos = *pos;
                let steering = ctx.actions.steering_mut();
                steering.set_destination(pos);
                steering.orient.set_pos_target(pos);
                Ok(true)
            }
            BbValue::Entity(entity) => {
                let entity = *entity;
                let Some(pos) = ctx.actions.entities().position(entity) else {
                    return Ok(false);
                };
                let offset = match self.look_mode {
                    LookMode::TowardsFace => ctx.actions.head_offset(entity).unwrap_or(Vec3::ZERO),
                    _ => Vec3::ZERO,
                };
                let steering = ctx.actions.steering_mut();
                steering.set_destination(pos);
                steering.orient.set_entity_target(entity, offset);
                Ok(true)
            }
            BbValue::Unset => Ok(false),
            other => Err(BehaviorError::TypeMismatch {
                key:      self.target_bb_key.clone(),
                expected: "a position or an entity",
                found:    other.kind_name(),
            }),
        }
    }
}

impl SetOrientTowardsParameters {
    fn apply(&self, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
        let target = match self.orient_type {
            OrientType::Unoriented => OrientTarget::Unoriented,
            OrientType::Velocity   => OrientTarget::Velocity,
            OrientType::Position   => {
                match ctx.blackboard.point(&self.target_blackboard_key, ctx.actions.entities())? {
                    Some(pos) => OrientTarget::Position(pos),
                    None      => OrientTarget::Unoriented,
                }
            }
            OrientType::Entity => match ctx.blackboard.entity(&self.target_blackboard_key)? {
                Some(entity) => OrientTarget::Entity { entity, offset: Vec3::ZERO },
                None         => OrientTarget::Unoriented,
            },
        };
        let steering = ctx.actions.steering_mut();
        steering.set_look_mode(LookMode::Unoriented);
        steering.orient.set_locks(self.x_locked, self.y_locked, self.z_locked);
        steering.orient.turn_speed = self.turn_speed;
        steering.orient.target = target;
        Ok(())
    }
}

/// Nearest walkable point to the owner, if any.
fn closest_walkable(ctx: &TickContext<'_>) -> Option<Vec3> {
    let position = ctx.actions.steering().body.position;
    ctx.actions.sample_walkable(position, NAVMESH_SAMPLE_DIST)
}

/// Pick a random horizontal direction that is not immediately blocked.
/// Returns the last direction tried and whether it was clear.
fn probe_direction(ctx: &mut TickContext<'_>) -> (Vec3, bool) {
    let origin = ctx.actions.steering().body.position + Vec3::Y;
    let mut dir = Vec3::ZERO;
    for _ in 0..RANDOM_MOVE_ATTEMPTS {
        dir = Vec3::new(ctx.rng.range_f32(-1.0, 1.0), 0.0, ctx.rng.range_f32(-1.0, 1.0)).normalize_or_zero();
        if !ctx.actions.is_blocked(origin, dir, RANDOM_MOVE_PROBE) {
            return (dir, true);
        }
    }
    (dir, false)
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

pub(crate) fn enter(node: &mut Node, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
    node.status = NodeStatus::Running;
    match &node.kind {
        NodeKind::Melee(_) => ctx.actions.melee_swing(),

        NodeKind::Shoot(p) => {
            let Some(target) = ctx.blackboard.point(&p.bb_target_key, ctx.actions.entities())? else {
                node.status = NodeStatus::Fail;
                return Ok(());
            };
            let projectile = match p.bb_projectile_key.as_str() {
                "" => None,
                key => ctx.blackboard.text(key)?.map(str::to_owned),
            };
            ctx.actions.shoot(ShotRequest {
                target,
                projectile,
                num_shots:          p.num_shots,
                destroy_after_time: p.destroy_after_time,
                spread:             p.spread,
                arc:                p.use_arc.then_some(ArcShot {
                    peak_height_offset: p.peak_height_offset,
                    peak_random:        p.peak_random,
                }),
            });
            node.status = NodeStatus::Success;
        }

        NodeKind::MoveTo(p) => {
            let Some(target) = ctx.blackboard.point(&p.target_bb_key, ctx.actions.entities())? else {
                node.status = NodeStatus::Fail;
                return Ok(());
            };
            let steering = ctx.actions.steering_mut();
            if p.move_speed > 0.0 {
                steering.config.move_speed = p.move_speed;
            }
            if steering.is_near(target) {
                node.status = NodeStatus::Success;
            } else {
                steering.set_destination(target);
            }
        }

        NodeKind::MoveToNavMesh(_) => match closest_walkable(ctx) {
            Some(point) => {
                node.scratch.point = point;
                node.scratch.timer = ctx.rng.range_f32(
                    NAVMESH_RUN_TIME - NAVMESH_RUN_RANDOM,
                    NAVMESH_RUN_TIME + NAVMESH_RUN_RANDOM,
                );
            }
            None => node.status = NodeStatus::Fail,
        },

        NodeKind::SetAnimParam(p) => {
            let value = anim_value(p.param_type, p.bool_val, p.float_val, p.int_val);
            ctx.actions.set_anim_param(&p.param_name, value);
            node.status = NodeStatus::Success;
        }

        NodeKind::PlayAnim(p) => {
            let value = anim_value(p.param_type, p.bool_val, p.float_val, p.int_val);
            ctx.actions.set_anim_param(&p.param_name, value);
            node.scratch.timer = ctx.actions.anim_state_length();
        }

        NodeKind::Idle(p) => {
            node.scratch.timer = ctx.rng.jitter(p.idle_time, p.idle_time_random);
        }

        NodeKind::MoveRandomly(p) => {
            node.scratch.timer = ctx.rng.jitter(p.time_spent_moving, p.time_spent_moving_rand);
            let (dir, clear) = probe_direction(ctx);
            node.scratch.dir = dir;
            if !clear && p.fail_if_directionless {
                node.status = NodeStatus::Fail;
            }
        }

        NodeKind::SendEvent(p) => {
            let target = (!p.target_name.is_empty()).then_some(p.target_name.as_str());
            debug!(event = %p.event_name, target = target.unwrap_or("self"), "sending event");
            ctx.actions.send_event(target, &p.event_name);
            node.status = NodeStatus::Success;
        }

        NodeKind::PlaySound(p) => {
            let at = ctx.actions.steering().body.position;
            ctx.actions.play_sound(&p.sound_path, at);
            node.status = NodeStatus::Success;
        }

        NodeKind::DebugMessage(p) => {
            if p.bb_key_to_print.is_empty() {
                info!("{}", p.message);
            } else {
                let value = ctx.blackboard.get(&p.bb_key_to_print)?;
                info!("BBKey ({}): {}", p.bb_key_to_print, value);
            }
            node.status = NodeStatus::Success;
        }

        NodeKind::Jump(p) => {
            ctx.actions.steering_mut().jump(p.jump_velocity);
            node.status = NodeStatus::Success;
        }

        NodeKind::Brake(_) => {
            ctx.actions.steering_mut().brake();
            node.status = NodeStatus::Success;
        }

        NodeKind::SetSteeringParameters(p) => {
            p.apply(ctx.actions.steering_mut());
            node.status = NodeStatus::Success;
        }

        NodeKind::SetOrientTowardsParameters(p) => {
            p.apply(ctx)?;
            node.status = NodeStatus::Success;
        }

        NodeKind::SteerTo(p) => {
            let steering = ctx.actions.steering_mut();
            steering.cancel_braking();
            p.apply(steering);
            node.scratch.count = 0;
            if !p.retarget(ctx)? {
                node.status = NodeStatus::Fail;
            }
        }

        _ => {}
    }
    Ok(())
}

pub(crate) fn update(node: &mut Node, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
    if !node.status.is_running() {
        return Ok(node.status);
    }
    match &node.kind {
        NodeKind::Idle(_) | NodeKind::PlayAnim(_) => {
            node.scratch.timer -= ctx.dt;
            if node.scratch.timer <= 0.0 {
                node.status = NodeStatus::Success;
            }
        }

        NodeKind::MoveRandomly(_) => {
            node.scratch.timer -= ctx.dt;
            if node.scratch.timer <= 0.0 {
                node.status = NodeStatus::Success;
            }
            ctx.actions.steering_mut().add_movement_input(node.scratch.dir);
        }

        NodeKind::MoveToNavMesh(_) => {
            let steering = ctx.actions.steering();
            let position = steering.body.position;
            let height = steering.body.height;
            let on_ground = steering.on_ground();
            let goal = node.scratch.point;

            let reach = height / 2.0 + 0.2;
            if dist_sqr(position, goal) < reach * reach {
                node.status = NodeStatus::Success;
                return Ok(node.status);
            }
            ctx.actions.steering_mut().add_movement_input(goal - position);

            node.scratch.timer -= ctx.dt;
            if on_ground && node.scratch.timer < 0.0 {
                node.scratch.timer = ctx.rng.range_f32(
                    NAVMESH_RUN_TIME - NAVMESH_RUN_RANDOM,
                    NAVMESH_RUN_TIME + NAVMESH_RUN_RANDOM,
                );
                if let Some(point) = closest_walkable(ctx) {
                    node.scratch.point = point;
                }
                let goal = node.scratch.point;
                let peak = position.y.max(goal.y) + height * ctx.rng.range_f32(0.5, 3.0);
                ctx.actions.steering_mut().jump_with(jump_velocity(position, goal, peak, 0.0));
            }
        }

        NodeKind::SteerTo(p) => {
            if node.scratch.count > 0 {
                node.scratch.count -= 1;
            } else {
                node.scratch.count = ctx.rng.range_i32(RETARGET_TICKS.0, RETARGET_TICKS.1);
                p.retarget(ctx)?;
            }
        }

        NodeKind::ChangeColor(p) => {
            ctx.actions.set_color(p.to_change_to);
            node.status = NodeStatus::Success;
        }

        _ => {}
    }
    Ok(node.status)
}

/// Side effects of interrupting a leaf.  The caller marks it `Fail`.
pub(crate) fn exit(node: &Node, ctx: &mut TickContext<'_>) {
    match &node.kind {
        NodeKind::Melee(_)   => ctx.actions.melee_cancel(),
        NodeKind::MoveTo(_)  => ctx.actions.steering_mut().abort_pathing(),
        NodeKind::SteerTo(_) => ctx.actions.steering_mut().brake(),
        _ => {}
    }
}

/// Apply a completion signal to a running leaf.  Returns whether it
/// changed the leaf's status.
pub(crate) fn on_signal(node: &mut Node, signal: &Signal) -> bool {
    if !node.status.is_running() {
        return false;
    }
    let completes = match (signal, &node.kind) {
        (Signal::Arrived { .. }, NodeKind::MoveTo(_) | NodeKind::SteerTo(_)) => true,
        (Signal::MeleeFinished, NodeKind::Melee(_)) => true,
        _ => false,
    };
    if completes {
        node.status = NodeStatus::Success;
    }
    completes
}
