//! `SteeringController`: the per-body locomotion state machine.

use tracing::{debug, trace};

use hz_core::math::{dist_sqr, flatten, horizontal_dist_sqr, jump_velocity, orthonormalize, project_on_plane};
use hz_core::{AgentRng, EntityId, EntityLocator, Vec2, Vec3};

use crate::behaviors;
use crate::orient::{OrientTarget, OrientTowards};
use crate::params::{LookMode, SteeringConfig};
use crate::query::{CollisionQuery, NavPath, NeighborQuery, ObstacleContact, OffMeshLink, PathProvider};
use crate::Body;

/// Give up on an obstacle climb after this many seconds.
pub const TRY_OBSTACLE_TIME: f32 = 3.5;

/// Seconds after a jump during which the grounding probe is skipped.
const CANT_GROUND_TIME: f32 = 0.2;

/// Extra probe length below the capsule when testing for ground.
const GROUND_PROBE_SLACK: f32 = 0.2;

/// Squared radius around a path corner that counts as reaching it.
const CORNER_REACHED_DIST_SQR: f32 = 1.5 * 1.5;

/// Fraction of `max_speed` used while climbing an obstacle.
const CLIMB_SPEED_FACTOR: f32 = 0.6;

/// Neighbor refresh interval, in ticks.
const NEIGHBOR_REFRESH_TICKS: (i32, i32) = (180, 600);

/// Off-mesh link jump apex, in body heights above the higher endpoint.
const LINK_PEAK_HEIGHTS: (f32, f32) = (1.5, 2.5);

// ── Public types ──────────────────────────────────────────────────────────────

/// Exactly one of these is active on any tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LocomotionMode {
    Grounded,
    Airborne,
    /// Kinematic clamber over a traversable obstacle.
    ObstacleTraversal,
}

/// Notifications produced by `fixed_update`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum SteeringEvent {
    /// Pathing concluded within arrival distance of the destination.
    Arrived { destination: Vec3 },
}

/// Services and timing for one fixed update.
pub struct SteeringEnv<'a> {
    pub dt:        f32,
    pub collision: &'a dyn CollisionQuery,
    pub paths:     &'a dyn PathProvider,
    pub neighbors: &'a dyn NeighborQuery,
    pub entities:  &'a dyn EntityLocator,
}

#[derive(Copy, Clone, Debug)]
struct BrakeState {
    start_speed: f32,
    elapsed:     f32,
}

#[derive(Copy, Clone, Debug)]
struct ClimbState {
    target:  Vec3,
    elapsed: f32,
}

// ── SteeringController ────────────────────────────────────────────────────────

/// Blends weighted steering behaviors into forces on a [`Body`].
///
/// Movement intent arrives through [`add_movement_input`](Self::add_movement_input),
/// [`jump`](Self::jump), [`set_destination`](Self::set_destination) and
/// [`brake`](Self::brake); [`fixed_update`](Self::fixed_update) turns it into
/// accelerations on the body, which the world then integrates.
#[derive(Clone, Debug)]
pub struct SteeringController {
    pub body:   Body,
    pub config: SteeringConfig,
    pub orient: OrientTowards,
    entity:     EntityId,

    // ── Pathing ───────────────────────────────────────────────────────────
    destination:         Vec3,
    pending_destination: Option<Vec3>,
    pathing:             bool,
    path:                NavPath,
    corner_index:        usize,
    desired_vel:         Vec3,

    // ── Input ─────────────────────────────────────────────────────────────
    input:      Vec3,
    jump_input: Option<Vec3>,

    // ── Grounding ─────────────────────────────────────────────────────────
    on_ground:          bool,
    prev_on_ground:     bool,
    ground_normal:      Vec3,
    cant_ground_timer:  f32,
    is_jumping:         bool,
    target_landing:     Vec3,

    // ── Timed states ──────────────────────────────────────────────────────
    brake:          Option<BrakeState>,
    climb:          Option<ClimbState>,
    braking_force:  Vec3,
    wander_angle:   f32,

    // ── Neighbors ─────────────────────────────────────────────────────────
    neighbors:         Vec<EntityId>,
    neighbor_countdown: i32,
}

impl SteeringController {
    pub fn new(entity: EntityId, body: Body, config: SteeringConfig) -> Self {
        let mut controller = Self {
            body,
            config:              config.clone(),
            orient:              OrientTowards::default(),
            entity,
            destination:         Vec3::ZERO,
            pending_destination: None,
            pathing:             false,
            path:                NavPath::default(),
            corner_index:        0,
            desired_vel:         Vec3::ZERO,
            input:               Vec3::ZERO,
            jump_input:          None,
            on_ground:           false,
            prev_on_ground:      false,
            ground_normal:       Vec3::Y,
            cant_ground_timer:   0.0,
            is_jumping:          false,
            target_landing:      Vec3::ZERO,
            brake:               None,
            climb:               None,
            braking_force:       Vec3::ZERO,
            wander_angle:        std::f32::consts::FRAC_PI_2,
            neighbors:           Vec::new(),
            neighbor_countdown:  0,
        };
        controller.set_look_mode(config.look_mode);
        controller
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    #[inline]
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    #[inline]
    pub fn is_pathing(&self) -> bool {
        self.pathing
    }

    #[inline]
    pub fn is_braking(&self) -> bool {
        self.brake.is_some()
    }

    #[inline]
    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    /// A destination requested while airborne, waiting for ground contact.
    #[inline]
    pub fn pending_destination(&self) -> Option<Vec3> {
        self.pending_destination
    }

    /// Last blended steering direction.
    #[inline]
    pub fn desired_velocity(&self) -> Vec3 {
        self.desired_vel
    }

    #[inline]
    pub fn neighbors(&self) -> &[EntityId] {
        &self.neighbors
    }

    #[inline]
    pub fn look_mode(&self) -> LookMode {
        self.config.look_mode
    }

    pub fn mode(&self) -> LocomotionMode {
        if self.climb.is_some() {
            LocomotionMode::ObstacleTraversal
        } else if self.on_ground {
            LocomotionMode::Grounded
        } else {
            LocomotionMode::Airborne
        }
    }

    /// `true` when the body is within arrival distance of `point`.
    #[inline]
    pub fn is_near(&self, point: Vec3) -> bool {
        horizontal_dist_sqr(self.body.position, point) < self.config.near_dist * self.config.near_dist
    }

    // ── Intent ────────────────────────────────────────────────────────────

    /// Accumulate movement input for this tick.  Calls add together.
    pub fn add_movement_input(&mut self, dir: Vec3) {
        self.input += dir;
    }

    /// Jump straight up at `speed`, keeping the current horizontal velocity.
    pub fn jump(&mut self, speed: f32) {
        let v = self.body.velocity;
        self.jump_with(Vec3::new(v.x, speed, v.z));
    }

    /// Jump with an explicit launch velocity.  Ignored unless grounded on
    /// the next fixed update.
    pub fn jump_with(&mut self, velocity: Vec3) {
        self.jump_input = Some(velocity);
    }

    /// Begin pathing to `pos`.  The path is computed on the first fixed
    /// update where the body is grounded.
    pub fn set_destination(&mut self, pos: Vec3) {
        self.pending_destination = Some(pos);
    }

    /// Stop pathing and decelerate to rest over `brake_time`.
    pub fn brake(&mut self) {
        self.pathing = false;
        self.pending_destination = None;
        self.brake = Some(BrakeState {
            start_speed: self.body.velocity.length(),
            elapsed:     0.0,
        });
    }

    pub fn abort_pathing(&mut self) {
        self.brake();
    }

    pub fn cancel_braking(&mut self) {
        self.brake = None;
    }

    /// Changing the look mode resets the orientation target: `ActualVel`
    /// tracks velocity, every other mode starts unoriented until a target
    /// is supplied.
    pub fn set_look_mode(&mut self, mode: LookMode) {
        self.orient.target = match mode {
            LookMode::ActualVel => OrientTarget::Velocity,
            _                   => OrientTarget::Unoriented,
        };
        self.config.look_mode = mode;
    }

    /// Report a physical contact from the world's collision pass.
    ///
    /// Starts an obstacle climb when the contact is with a traversable
    /// obstacle in front of the body and above foot height.
    pub fn on_collision(&mut self, contact: &ObstacleContact) {
        if self.climb.is_some() || !contact.traversable {
            return;
        }
        let towards = contact.center - self.body.position;
        let in_front = self.body.forward.dot(towards) > 0.0;
        let above_feet = contact.point.y > self.body.position.y + self.body.radius;
        if in_front && above_feet {
            let target = Vec3::new(contact.point.x, contact.top_y, contact.point.z);
            debug!(entity = %self.entity, ?target, "starting obstacle climb");
            self.climb = Some(ClimbState { target, elapsed: 0.0 });
            self.body.kinematic = true;
        }
    }

    // ── Fixed update ──────────────────────────────────────────────────────

    /// Advance the controller by one fixed step.  Does not integrate the
    /// body; the world does that after every controller has run.
    pub fn fixed_update(&mut self, env: &SteeringEnv<'_>, rng: &mut AgentRng) -> Vec<SteeringEvent> {
        let mut events = Vec::new();

        self.grounding_update(env);
        self.jump_update(env.dt);
        self.pending_destination_update(env);

        if self.climb.is_some() {
            self.obstacle_update(env.dt);
        } else if self.on_ground {
            if !self.prev_on_ground && !self.is_jumping {
                // Landed: keep only the along-ground part of the fall.
                self.body.velocity = project_on_plane(self.body.velocity, self.ground_normal);
            }
            if self.pathing {
                self.pathing_update(env, rng, &mut events);
            }
            if self.input != Vec3::ZERO {
                self.ground_input_update();
            }
            self.neighbors_update(env, rng);
            self.cap_velocity();
        } else {
            if !self.is_jumping && self.prev_on_ground {
                self.stick_to_ground();
            }
            self.air_input_update();
        }

        self.brake_update(env.dt);
        self.orient.update(&mut self.body, env.dt, env.entities);
        self.input = Vec3::ZERO;
        self.is_jumping = false;
        events
    }

    fn grounding_update(&mut self, env: &SteeringEnv<'_>) {
        self.prev_on_ground = self.on_ground;
        if self.cant_ground_timer > 0.0 {
            return;
        }
        let dist = self.body.height * 0.5 + GROUND_PROBE_SLACK;
        match env.collision.ground_probe(self.body.center(), self.body.radius * 0.5, dist) {
            Some(hit) => {
                self.on_ground = true;
                self.ground_normal = hit.normal;
            }
            None => self.on_ground = false,
        }
    }

    fn jump_update(&mut self, dt: f32) {
        if let Some(v) = self.jump_input.take() {
            if self.on_ground {
                trace!(entity = %self.entity, ?v, "jump");
                self.body.velocity = v;
                self.is_jumping = true;
                self.on_ground = false;
                self.cant_ground_timer = CANT_GROUND_TIME;
            }
        }
        self.cant_ground_timer -= dt;
    }

    fn pending_destination_update(&mut self, env: &SteeringEnv<'_>) {
        if !self.on_ground {
            return;
        }
        if let Some(pos) = self.pending_destination.take() {
            self.start_path(pos, env);
        }
    }

    fn start_path(&mut self, pos: Vec3, env: &SteeringEnv<'_>) {
        self.destination = pos;
        self.pathing = true;
        self.corner_index = 0;
        self.brake = None;
        // An unreachable destination leaves the path empty; the body then
        // heads straight at it.
        self.path = env.paths.calculate_path(self.body.position, pos).unwrap_or_default();
        if self.config.look_mode == LookMode::AlongPath {
            let first = self.path.corners.first().copied().unwrap_or(pos);
            self.orient.set_pos_target(first + Vec3::Y * (self.body.height * 0.5));
        }
        trace!(entity = %self.entity, ?pos, corners = self.path.corners.len(), "path started");
    }

    fn pathing_update(&mut self, env: &SteeringEnv<'_>, rng: &mut AgentRng, events: &mut Vec<SteeringEvent>) {
        if self.is_near(self.destination) {
            self.finish_pathing(events);
            return;
        }

        let w = self.config.weights;
        let pos = self.body.position;

        // ── Blend ─────────────────────────────────────────────────────────
        let mut avoidance = Vec3::ZERO;
        self.braking_force = Vec3::ZERO;
        if w.avoidance != 0.0 || self.config.avoidance.insta_vel != 0.0 {
            let result = behaviors::avoidance(
                pos, self.body.forward, &self.config.avoidance, env.collision, self.entity, rng,
            );
            avoidance = result.steer * w.avoidance;
            self.braking_force = result.braking;
        }

        let mut desired = avoidance;
        if w.pathing != 0.0 {
            desired += behaviors::follow_path(pos, &self.path.corners, self.corner_index, self.destination)
                * w.pathing;
        }
        if w.run_at != 0.0 {
            desired += behaviors::seek(pos, self.destination) * w.run_at;
        }
        if w.separation != 0.0 {
            let positions = self.neighbors.iter().filter_map(|&n| env.entities.position(n));
            desired += behaviors::separation(pos, positions) * w.separation;
        }
        if w.wander != 0.0 {
            desired += behaviors::wander(
                &mut self.wander_angle, &self.config.wander, self.body.forward, env.dt, rng,
            ) * w.wander;
        }
        desired = flatten(desired);
        self.desired_vel = desired;
        self.add_movement_input(desired);

        self.body.add_impulse(avoidance * self.config.avoidance.insta_vel * env.dt);
        self.body.add_acceleration(self.braking_force * w.braking * env.dt);

        if self.config.look_mode == LookMode::DesiredVel {
            self.orient.set_pos_target(pos + desired);
        }

        // ── Corner advance ────────────────────────────────────────────────
        let Some(&corner) = self.path.corners.get(self.corner_index) else {
            return;
        };
        if dist_sqr(pos, corner) >= CORNER_REACHED_DIST_SQR {
            return;
        }
        if let Some(link) = self.path.link_at(corner).copied() {
            self.enter_off_mesh_link(link, rng);
        }
        self.corner_index += 1;
        match self.path.corners.get(self.corner_index) {
            None => {
                self.finish_pathing(events);
                if self.config.look_mode == LookMode::AlongPath {
                    self.orient.set_pos_target(self.destination);
                }
            }
            Some(&next) => {
                if self.config.look_mode == LookMode::AlongPath {
                    self.orient.set_pos_target(next);
                }
            }
        }
    }

    fn enter_off_mesh_link(&mut self, link: OffMeshLink, rng: &mut AgentRng) {
        if !self.on_ground {
            return;
        }
        let (lo, hi) = LINK_PEAK_HEIGHTS;
        let peak = link.end.y.max(link.start.y) + self.body.height * rng.range_f32(lo, hi);
        self.target_landing = link.end;
        debug!(entity = %self.entity, start = ?link.start, end = ?link.end, "jumping off-mesh link");
        self.jump_with(jump_velocity(self.body.position, link.end, peak, 0.0));
    }

    fn finish_pathing(&mut self, events: &mut Vec<SteeringEvent>) {
        self.pathing = false;
        events.push(SteeringEvent::Arrived { destination: self.destination });
        self.brake();
    }

    fn ground_input_update(&mut self) {
        let dir = orthonormalize(self.ground_normal, self.input);
        self.body.add_acceleration(dir * self.config.move_speed);
    }

    fn air_input_update(&mut self) {
        let dir = self.input.normalize_or_zero();
        self.body.add_acceleration(dir * self.config.move_speed * self.config.air_control);
        if matches!(self.config.look_mode, LookMode::DesiredVel | LookMode::AlongPath) {
            self.orient.set_pos_target(self.target_landing);
        }
    }

    /// Walking off a ledge: bend the velocity down the slope instead of
    /// launching off it.
    fn stick_to_ground(&mut self) {
        let projected = project_on_plane(self.body.velocity, self.ground_normal);
        self.body.velocity = Vec3::new(projected.x, -self.ground_normal.y, projected.z);
    }

    fn neighbors_update(&mut self, env: &SteeringEnv<'_>, rng: &mut AgentRng) {
        self.neighbor_countdown -= 1;
        if self.neighbor_countdown > 0 {
            return;
        }
        let (lo, hi) = NEIGHBOR_REFRESH_TICKS;
        self.neighbor_countdown = rng.range_i32(lo, hi);
        self.neighbors = env.neighbors.neighbors_within(
            self.body.position,
            self.config.neighborhood_range,
            self.entity,
        );
    }

    fn cap_velocity(&mut self) {
        let v = self.body.velocity;
        let ground = Vec2::new(v.x, v.z);
        let max = self.config.max_speed;
        if ground.length_squared() > max * max {
            let capped = ground.normalize() * max;
            self.body.velocity = Vec3::new(capped.x, v.y, capped.y);
        }
    }

    fn obstacle_update(&mut self, dt: f32) {
        let Some(mut climb) = self.climb else {
            return;
        };
        climb.elapsed += dt;
        if climb.elapsed > TRY_OBSTACLE_TIME {
            debug!(entity = %self.entity, "obstacle climb timed out");
            self.climb = None;
            self.body.kinematic = false;
            return;
        }

        if self.body.position.y < climb.target.y {
            let dir = (climb.target - self.body.position).normalize_or_zero();
            self.body.position += dir * self.config.max_speed * CLIMB_SPEED_FACTOR * dt;
            self.climb = Some(climb);
        } else {
            self.body.position = climb.target;
            self.body.velocity = Vec3::ZERO;
            self.climb = None;
            self.body.kinematic = false;
        }

        if matches!(self.config.look_mode, LookMode::DesiredVel | LookMode::AlongPath) {
            self.orient.set_pos_target(climb.target);
        }
    }

    /// Linear falloff of speed to zero over `brake_time`, preserving
    /// direction.
    fn brake_update(&mut self, dt: f32) {
        let Some(mut state) = self.brake else {
            return;
        };
        let brake_time = self.config.brake_time.max(f32::EPSILON);
        if state.elapsed > brake_time {
            self.body.velocity = Vec3::ZERO;
            self.brake = None;
            return;
        }
        let speed = state.start_speed * (1.0 - state.elapsed / brake_time);
        self.body.velocity = self.body.velocity.normalize_or_zero() * speed;
        state.elapsed += dt;
        self.brake = Some(state);
    }
}
