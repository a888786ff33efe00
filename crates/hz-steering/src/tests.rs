//! Unit tests for hz-steering.

use std::collections::BTreeMap;

use hz_core::{AgentRng, EntityId, Vec3};

use crate::{
    Body, CollisionQuery, NavPath, NeighborQuery, PathProvider, RayHit, SteeringConfig,
    SteeringController, SteeringEnv, SteeringEvent,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DT: f32 = 0.02;

/// Floor plane at `y = 0` plus axis-aligned boxes.
#[derive(Default)]
struct TestWorld {
    boxes:     Vec<(Vec3, Vec3)>,
    path:      Option<NavPath>,
    neighbors: Vec<EntityId>,
    positions: BTreeMap<EntityId, Vec3>,
}

fn ray_box(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut normal = Vec3::ZERO;
    for axis in 0..3 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], min[axis], max[axis]);
        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
        let mut n = Vec3::ZERO;
        n[axis] = -d.signum();
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_near {
            t_near = t0;
            normal = n;
        }
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }
    (t_near >= 0.0).then_some((t_near, normal))
}

impl CollisionQuery for TestWorld {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, _ignore: Option<EntityId>) -> Option<RayHit> {
        let dir = dir.normalize_or_zero();
        let mut best: Option<RayHit> = None;
        let mut consider = |t: f32, normal: Vec3| {
            if t <= max_dist && best.is_none_or(|b| t < b.distance) {
                best = Some(RayHit { point: origin + dir * t, normal, distance: t, entity: None });
            }
        };
        if dir.y < 0.0 && origin.y >= 0.0 {
            consider(-origin.y / dir.y, Vec3::Y);
        }
        for &(min, max) in &self.boxes {
            if let Some((t, n)) = ray_box(origin, dir, min, max) {
                consider(t, n);
            }
        }
        best
    }
}

impl PathProvider for TestWorld {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> Option<NavPath> {
        Some(self.path.clone().unwrap_or_else(|| NavPath::straight(from, to)))
    }

    fn sample_position(&self, near: Vec3, _max_dist: f32) -> Option<Vec3> {
        Some(Vec3::new(near.x, 0.0, near.z))
    }
}

impl NeighborQuery for TestWorld {
    fn neighbors_within(&self, _center: Vec3, _radius: f32, exclude: EntityId) -> Vec<EntityId> {
        self.neighbors.iter().copied().filter(|&n| n != exclude).collect()
    }
}

fn env(world: &TestWorld) -> SteeringEnv<'_> {
    SteeringEnv {
        dt:        DT,
        collision: world,
        paths:     world,
        neighbors: world,
        entities:  &world.positions,
    }
}

fn quiet_config() -> SteeringConfig {
    let mut cfg = SteeringConfig::default();
    cfg.weights.avoidance = 0.0;
    cfg.avoidance.insta_vel = 0.0;
    cfg.weights.wander = 0.0;
    cfg.weights.separation = 0.0;
    cfg.weights.run_at = 0.0;
    cfg.weights.braking = 0.0;
    cfg
}

fn controller_at(pos: Vec3, cfg: SteeringConfig) -> SteeringController {
    SteeringController::new(EntityId(1), Body::new(pos), cfg)
}

/// One full physics step: controller, integration, floor contact.
fn step(c: &mut SteeringController, world: &TestWorld, rng: &mut AgentRng) -> Vec<SteeringEvent> {
    let events = c.fixed_update(&env(world), rng);
    c.body.integrate(DT);
    c.body.rest_on(0.0);
    events
}

// ── Locomotion ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod locomotion {
    use super::*;
    use crate::LocomotionMode;

    #[test]
    fn grounded_on_floor() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        step(&mut c, &world, &mut rng);
        assert!(c.on_ground());
        assert_eq!(c.mode(), LocomotionMode::Grounded);
    }

    #[test]
    fn airborne_above_probe_range() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::new(0.0, 5.0, 0.0), quiet_config());
        c.fixed_update(&env(&world), &mut rng);
        assert_eq!(c.mode(), LocomotionMode::Airborne);
    }

    #[test]
    fn horizontal_speed_is_capped() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        for _ in 0..200 {
            c.add_movement_input(Vec3::X);
            c.fixed_update(&env(&world), &mut rng);
            let v = c.body.velocity;
            let ground = (v.x * v.x + v.z * v.z).sqrt();
            assert!(ground <= c.config.max_speed + 1e-3, "speed {ground}");
            c.body.integrate(DT);
            c.body.rest_on(0.0);
        }
        assert!(c.body.position.x > 10.0);
    }

    #[test]
    fn jump_suppresses_regrounding_briefly() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        step(&mut c, &world, &mut rng);
        assert!(c.on_ground());

        c.jump(5.0);
        c.fixed_update(&env(&world), &mut rng);
        assert_eq!(c.mode(), LocomotionMode::Airborne);
        assert!((c.body.velocity.y - 5.0).abs() < 1e-5);

        // Still within the cooldown: the probe is skipped even though the
        // body has barely left the floor.
        c.body.integrate(DT);
        c.fixed_update(&env(&world), &mut rng);
        assert!(!c.on_ground());
    }

    #[test]
    fn jump_ignored_while_airborne() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::new(0.0, 5.0, 0.0), quiet_config());
        c.jump(5.0);
        c.fixed_update(&env(&world), &mut rng);
        assert_eq!(c.body.velocity.y, 0.0);
    }

    #[test]
    fn brake_reaches_rest_within_brake_time() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        step(&mut c, &world, &mut rng);
        c.body.velocity = Vec3::new(8.0, 0.0, 0.0);
        c.brake();
        let mut last = f32::MAX;
        let ticks = (c.config.brake_time / DT) as usize + 3;
        for _ in 0..ticks {
            c.fixed_update(&env(&world), &mut rng);
            let speed = c.body.velocity.length();
            assert!(speed <= last + 1e-4);
            last = speed;
        }
        assert_eq!(c.body.velocity, Vec3::ZERO);
        assert!(!c.is_braking());
    }

    #[test]
    fn look_mode_resets_orientation_target() {
        use crate::{LookMode, OrientTarget};
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.set_look_mode(LookMode::ActualVel);
        assert_eq!(c.orient.target, OrientTarget::Velocity);
        c.set_look_mode(LookMode::AlongPath);
        assert_eq!(c.orient.target, OrientTarget::Unoriented);
    }
}

// ── Pathing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pathing {
    use super::*;
    use crate::{LocomotionMode, OffMeshLink};

    #[test]
    fn arrives_once_and_brakes() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(3, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.set_destination(Vec3::new(6.0, 0.0, 0.0));

        let mut arrivals = 0;
        for _ in 0..500 {
            for e in step(&mut c, &world, &mut rng) {
                let SteeringEvent::Arrived { destination } = e;
                assert_eq!(destination, Vec3::new(6.0, 0.0, 0.0));
                arrivals += 1;
            }
        }
        assert_eq!(arrivals, 1);
        assert!(!c.is_pathing());
        assert!(c.body.velocity.length() < 1e-3);
    }

    #[test]
    fn destination_waits_for_ground() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(3, EntityId(1));
        let mut c = controller_at(Vec3::new(0.0, 3.0, 0.0), quiet_config());
        c.set_destination(Vec3::new(6.0, 0.0, 0.0));
        c.fixed_update(&env(&world), &mut rng);
        assert!(!c.is_pathing());
        assert!(c.pending_destination().is_some());

        for _ in 0..200 {
            step(&mut c, &world, &mut rng);
            if c.is_pathing() {
                break;
            }
        }
        assert!(c.is_pathing());
        assert!(c.pending_destination().is_none());
    }

    #[test]
    fn abort_pathing_stops_and_brakes() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(3, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.set_destination(Vec3::new(20.0, 0.0, 0.0));
        for _ in 0..10 {
            step(&mut c, &world, &mut rng);
        }
        assert!(c.is_pathing());
        c.abort_pathing();
        assert!(!c.is_pathing());
        assert!(c.is_braking());
    }

    #[test]
    fn off_mesh_link_corner_triggers_jump() {
        let link = OffMeshLink { start: Vec3::ZERO, end: Vec3::new(4.0, 2.0, 0.0) };
        let world = TestWorld {
            path: Some(NavPath {
                corners: vec![Vec3::ZERO, Vec3::new(4.0, 2.0, 0.0), Vec3::new(10.0, 2.0, 0.0)],
                links:   vec![link],
            }),
            ..TestWorld::default()
        };
        let mut rng = AgentRng::new(3, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.set_destination(Vec3::new(10.0, 2.0, 0.0));

        c.fixed_update(&env(&world), &mut rng); // path starts, link queued
        c.fixed_update(&env(&world), &mut rng); // jump applied
        assert_eq!(c.mode(), LocomotionMode::Airborne);
        assert!(c.body.velocity.y > 0.0);
        assert!(c.body.velocity.x > 0.0);
    }
}

// ── Obstacle traversal ────────────────────────────────────────────────────────

#[cfg(test)]
mod obstacles {
    use super::*;
    use crate::controller::TRY_OBSTACLE_TIME;
    use crate::{LocomotionMode, ObstacleContact};

    fn contact(top_y: f32, traversable: bool) -> ObstacleContact {
        ObstacleContact {
            point:  Vec3::new(0.0, 0.8, 1.0),
            center: Vec3::new(0.0, 0.5, 1.5),
            top_y,
            traversable,
        }
    }

    #[test]
    fn climbs_to_top_and_restores_physics() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(5, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.on_collision(&contact(1.0, true));
        assert_eq!(c.mode(), LocomotionMode::ObstacleTraversal);
        assert!(c.body.kinematic);

        for _ in 0..100 {
            c.fixed_update(&env(&world), &mut rng);
            if c.mode() != LocomotionMode::ObstacleTraversal {
                break;
            }
        }
        assert_ne!(c.mode(), LocomotionMode::ObstacleTraversal);
        assert!(!c.body.kinematic);
        assert_eq!(c.body.position, Vec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn climb_times_out() {
        let world = TestWorld::default();
        let mut rng = AgentRng::new(5, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.on_collision(&contact(500.0, true));
        let limit = (TRY_OBSTACLE_TIME / DT) as usize + 5;
        for _ in 0..limit {
            c.fixed_update(&env(&world), &mut rng);
        }
        assert_ne!(c.mode(), LocomotionMode::ObstacleTraversal);
        assert!(!c.body.kinematic);
        assert!(c.body.position.y < 500.0);
    }

    #[test]
    fn ignores_untagged_or_low_or_behind() {
        let mut c = controller_at(Vec3::ZERO, quiet_config());
        c.on_collision(&contact(1.0, false));
        assert_ne!(c.mode(), LocomotionMode::ObstacleTraversal);

        let low = ObstacleContact { point: Vec3::new(0.0, 0.2, 1.0), ..contact(1.0, true) };
        c.on_collision(&low);
        assert_ne!(c.mode(), LocomotionMode::ObstacleTraversal);

        let behind = ObstacleContact { center: Vec3::new(0.0, 0.5, -1.5), ..contact(1.0, true) };
        c.on_collision(&behind);
        assert_ne!(c.mode(), LocomotionMode::ObstacleTraversal);
    }
}

// ── Sub-behaviors ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod behaviors {
    use super::*;
    use crate::behaviors::{avoidance, separation, wander};
    use crate::{AvoidanceTuning, WanderTuning};

    #[test]
    fn separation_points_away() {
        let out = separation(Vec3::ZERO, [Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
        assert!((out - Vec3::NEG_X).length() < 1e-5);
        assert_eq!(separation(Vec3::ZERO, Vec::<Vec3>::new()), Vec3::ZERO);
    }

    #[test]
    fn wander_is_unit_and_drifts_slowly() {
        let mut rng = AgentRng::new(2, EntityId(0));
        let tuning = WanderTuning::default();
        let mut angle = 1.0;
        for _ in 0..50 {
            let before = angle;
            let dir = wander(&mut angle, &tuning, Vec3::Z, DT, &mut rng);
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert!((angle - before).abs() <= tuning.jitter * DT + 1e-6);
        }
    }

    #[test]
    fn avoidance_steers_away_from_right_wall() {
        // Wall occupying only the right half-space ahead.
        let world = TestWorld {
            boxes: vec![(Vec3::new(0.05, -1.0, 0.5), Vec3::new(5.0, 3.0, 5.0))],
            ..TestWorld::default()
        };
        let tuning = AvoidanceTuning { spread: 90.0, ..AvoidanceTuning::default() };
        let mut hits = 0;
        for seed in 0..64 {
            let mut rng = AgentRng::new(seed, EntityId(0));
            let out = avoidance(Vec3::new(0.0, 0.5, 0.0), Vec3::Z, &tuning, &world, EntityId(0), &mut rng);
            if out.steer != Vec3::ZERO {
                hits += 1;
                assert!((out.steer - Vec3::NEG_X).length() < 1e-5, "steer {:?}", out.steer);
                assert!(out.braking.dot(Vec3::Z) < 0.0);
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn separation_weight_feeds_blend() {
        let mut world = TestWorld::default();
        world.neighbors = vec![EntityId(2)];
        world.positions.insert(EntityId(2), Vec3::new(0.0, 0.0, -1.0));
        let mut cfg = quiet_config();
        cfg.weights.pathing = 0.0;
        cfg.weights.separation = 1.0;
        let mut rng = AgentRng::new(1, EntityId(1));
        let mut c = controller_at(Vec3::ZERO, cfg);
        c.set_destination(Vec3::new(0.0, 0.0, 30.0));
        // Neighbors are refreshed after the blend, so they count from the
        // second tick on.
        step(&mut c, &world, &mut rng);
        step(&mut c, &world, &mut rng);
        assert_eq!(c.neighbors(), &[EntityId(2)]);
        assert!(c.desired_velocity().z > 0.9);
    }

    #[test]
    fn config_validation() {
        let bad = SteeringConfig { max_speed: 0.0, ..SteeringConfig::default() };
        assert!(bad.validate().is_err());
        assert!(SteeringConfig::default().validate().is_ok());
    }
}
