//! Unit tests for hz-perception.

use std::collections::BTreeMap;

use hz_core::{AgentRng, EntityId, EntityLocator, Faction, SimRng, Vec3};
use hz_steering::{CollisionQuery, RayHit};

use crate::{
    Aggro, AggroConfig, AggroEffect, Perception, Sensable, SensableRegistry, SenseWorld, Sensing,
    SensingConfig,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DT: f32 = 0.02;
const ZOMBIE: EntityId = EntityId(1);
const ZOMBIE_2: EntityId = EntityId(2);
const SURVIVOR: EntityId = EntityId(7);
const SURVIVOR_2: EntityId = EntityId(8);

/// Entities are spheres around their head point; walls are boxes.
#[derive(Default)]
struct World {
    positions: BTreeMap<EntityId, Vec3>,
    walls:     Vec<(Vec3, Vec3)>,
}

impl World {
    fn with(mut self, entity: EntityId, pos: Vec3) -> Self {
        self.positions.insert(entity, pos);
        self
    }

    fn wall(mut self, min: Vec3, max: Vec3) -> Self {
        self.walls.push((min, max));
        self
    }

    fn sense(&self) -> SenseWorld<'_> {
        SenseWorld { entities: &self.positions, collision: self }
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

fn ray_box(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let (t0, t1) = ((min[axis] - o) / d, (max[axis] - o) / d);
        t_near = t_near.max(t0.min(t1));
        t_far = t_far.min(t0.max(t1));
        if t_near > t_far {
            return None;
        }
    }
    (t_near >= 0.0).then_some(t_near)
}

impl CollisionQuery for World {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, ignore: Option<EntityId>) -> Option<RayHit> {
        let mut best: Option<(f32, Option<EntityId>)> = None;
        let mut consider = |t: f32, entity: Option<EntityId>| {
            if t <= max_dist && best.is_none_or(|(b, _)| t < b) {
                best = Some((t, entity));
            }
        };
        for (&entity, &pos) in &self.positions {
            if Some(entity) == ignore {
                continue;
            }
            if let Some(t) = ray_sphere(origin, dir, pos + Sensable::DEFAULT_HEAD_OFFSET, 0.5) {
                consider(t, Some(entity));
            }
        }
        for &(min, max) in &self.walls {
            if let Some(t) = ray_box(origin, dir, min, max) {
                consider(t, None);
            }
        }
        best.map(|(t, entity)| RayHit {
            point: origin + dir * t,
            normal: -dir,
            distance: t,
            entity,
        })
    }
}

fn registry() -> SensableRegistry {
    let mut reg = SensableRegistry::new();
    reg.register(ZOMBIE, Sensable::new(Faction::Horde));
    reg.register(ZOMBIE_2, Sensable::new(Faction::Horde));
    reg.register(SURVIVOR, Sensable::new(Faction::Survivor));
    reg.register(SURVIVOR_2, Sensable::new(Faction::Survivor));
    reg
}

fn sensing() -> Sensing {
    Sensing::new(SensingConfig::default(), AgentRng::new(0, ZOMBIE))
}

/// Sense once from `ZOMBIE` and return what was detected.
fn sense_once(world: &World) -> Vec<EntityId> {
    let reg = registry();
    let mut s = sensing();
    let own = *reg.get(ZOMBIE).unwrap();
    s.sense(ZOMBIE, &own, &reg, world.sense());
    s.resolve();
    s.detected().iter().copied().collect()
}

/// Zombie at the origin facing +Z, one survivor in plain sight.
fn perception_scene() -> (Perception, World) {
    let world = World::default()
        .with(ZOMBIE, Vec3::ZERO)
        .with(SURVIVOR, Vec3::new(0.0, 0.0, 5.0));
    let mut p = Perception::new(3);
    p.add_sensable(ZOMBIE, Sensable::new(Faction::Horde));
    p.add_sensable(SURVIVOR, Sensable::new(Faction::Survivor));
    p.add_sensing(ZOMBIE, SensingConfig::default()).unwrap();
    p.add_aggro(ZOMBIE, AggroConfig::default()).unwrap();
    (p, world)
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use super::*;

    #[test]
    fn closest_prefers_lower_id_on_ties() {
        let reg = registry();
        let positions: BTreeMap<EntityId, Vec3> = [
            (SURVIVOR, Vec3::new(3.0, 0.0, 0.0)),
            (SURVIVOR_2, Vec3::new(-3.0, 0.0, 0.0)),
        ]
        .into();
        let closest = reg.closest_with_faction(Faction::Survivor, Vec3::ZERO, &positions);
        assert_eq!(closest, Some(SURVIVOR));

        let closer = reg.closest_with_faction(Faction::Survivor, Vec3::new(-1.0, 0.0, 0.0), &positions);
        assert_eq!(closer, Some(SURVIVOR_2));
    }

    #[test]
    fn unregister_leaves_faction() {
        let mut reg = registry();
        assert_eq!(reg.count(Faction::Survivor), 2);
        assert!(reg.unregister(SURVIVOR).is_some());
        assert_eq!(reg.members(Faction::Survivor).collect::<Vec<_>>(), vec![SURVIVOR_2]);
        assert!(reg.unregister(SURVIVOR).is_none());
    }

    #[test]
    fn reregister_moves_faction() {
        let mut reg = registry();
        reg.register(SURVIVOR, Sensable::new(Faction::Horde));
        assert_eq!(reg.count(Faction::Survivor), 1);
        assert_eq!(reg.count(Faction::Horde), 3);
    }

    #[test]
    fn random_picks_a_member() {
        let reg = registry();
        let mut rng = SimRng::new(11);
        for _ in 0..20 {
            let pick = reg.random_with_faction(Faction::Survivor, &mut rng).unwrap();
            assert!(pick == SURVIVOR || pick == SURVIVOR_2);
        }
        assert_eq!(SensableRegistry::new().random_with_faction(Faction::Horde, &mut rng), None);
    }

    #[test]
    fn unknown_priority_is_lowest() {
        let reg = registry();
        assert_eq!(reg.priority(SURVIVOR), Sensable::DEFAULT_PRIORITY);
        assert!(reg.priority(EntityId(99)) < f32::MIN);
    }
}

// ── Sensing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sensing {
    use super::*;

    #[test]
    fn sees_ahead_within_cone() {
        let world = World::default()
            .with(ZOMBIE, Vec3::ZERO)
            .with(SURVIVOR, Vec3::new(1.0, 0.0, 5.0));
        assert_eq!(sense_once(&world), vec![SURVIVOR]);
    }

    #[test]
    fn ignores_outside_cone_and_range() {
        let wide = World::default()
            .with(ZOMBIE, Vec3::ZERO)
            .with(SURVIVOR, Vec3::new(5.0, 0.0, 3.0));
        assert!(sense_once(&wide).is_empty());

        let far = World::default()
            .with(ZOMBIE, Vec3::ZERO)
            .with(SURVIVOR, Vec3::new(0.0, 0.0, 9.0));
        assert!(sense_once(&far).is_empty());
    }

    #[test]
    fn walls_block_sight() {
        let world = World::default()
            .with(ZOMBIE, Vec3::ZERO)
            .with(SURVIVOR, Vec3::new(0.0, 0.0, 5.0))
            .wall(Vec3::new(-2.0, -1.0, 2.0), Vec3::new(2.0, 3.0, 2.5));
        assert!(sense_once(&world).is_empty());
    }

    #[test]
    fn near_sense_ignores_facing_and_walls() {
        let world = World::default()
            .with(ZOMBIE, Vec3::ZERO)
            .with(SURVIVOR, Vec3::new(0.0, 0.0, -2.0))
            .wall(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 3.0, -0.5));
        assert_eq!(sense_once(&world), vec![SURVIVOR]);
    }

    #[test]
    fn friends_not_searched_by_default() {
        let world = World::default()
            .with(ZOMBIE, Vec3::ZERO)
            .with(ZOMBIE_2, Vec3::new(0.0, 0.0, 1.0));
        assert!(sense_once(&world).is_empty());

        let reg = registry();
        let mut s = Sensing::new(
            SensingConfig { detects_friendlies: true, ..SensingConfig::default() },
            AgentRng::new(0, ZOMBIE),
        );
        s.sense(ZOMBIE, reg.get(ZOMBIE).unwrap(), &reg, world.sense());
        assert!(s.pending().contains(&ZOMBIE_2));
        assert!(!s.pending().contains(&ZOMBIE));
    }

    #[test]
    fn resolve_splits_lost_and_gained() {
        let mut s = sensing();
        s.inject(SURVIVOR);
        let first = s.resolve();
        assert_eq!(first.gained, vec![SURVIVOR]);
        assert!(first.lost.is_empty());

        s.inject(SURVIVOR);
        s.inject(SURVIVOR_2);
        let second = s.resolve();
        assert_eq!(second.gained, vec![SURVIVOR_2]);
        assert!(second.lost.is_empty());

        s.inject(SURVIVOR_2);
        let third = s.resolve();
        assert_eq!(third.lost, vec![SURVIVOR]);
        assert!(third.gained.is_empty());
        assert_eq!(s.detected().iter().copied().collect::<Vec<_>>(), vec![SURVIVOR_2]);
        assert!(s.pending().is_empty());
    }

    #[test]
    fn throttle_waits_eight_to_eleven_ticks() {
        let mut s = sensing();
        assert!(s.tick_due(), "first tick senses immediately");
        for _ in 0..5 {
            let mut idle = 0;
            while !s.tick_due() {
                idle += 1;
            }
            assert!((8..=11).contains(&idle), "idle {idle}");
        }
    }
}

// ── Aggro ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod aggro {
    use super::*;

    fn aggroed_on_survivor() -> (Aggro, Sensing, SensableRegistry) {
        let reg = registry();
        let mut s = sensing();
        let mut a = Aggro::new(AggroConfig::default());
        let effects = a.on_detected(Faction::Horde, SURVIVOR, &reg, &mut s);
        assert_eq!(
            effects,
            vec![
                AggroEffect::Triggered { target: SURVIVOR },
                AggroEffect::Targeted { target: SURVIVOR },
            ]
        );
        (a, s, reg)
    }

    #[test]
    fn brief_loss_of_sight_keeps_aggro() {
        let (mut a, mut s, reg) = aggroed_on_survivor();
        a.on_lost(SURVIVOR);
        // 49 ticks = 0.98 s, just short of the 1 s aggro time.
        for _ in 0..49 {
            assert_eq!(a.update(DT, false, &mut s), None);
        }
        assert!(a.is_aggroed());

        let regained = a.on_detected(Faction::Horde, SURVIVOR, &reg, &mut s);
        assert_eq!(regained, vec![AggroEffect::Targeted { target: SURVIVOR }]);
        assert_eq!(a.timer(), 1.0);
        for _ in 0..200 {
            assert_eq!(a.update(DT, false, &mut s), None);
        }
        assert!(a.is_aggroed());
    }

    #[test]
    fn lapses_after_aggro_time() {
        let (mut a, mut s, _) = aggroed_on_survivor();
        a.on_lost(SURVIVOR);
        let mut lapsed_at = None;
        for tick in 1..=100 {
            if let Some(effect) = a.update(DT, false, &mut s) {
                assert_eq!(effect, AggroEffect::Lost { target: Some(SURVIVOR) });
                lapsed_at = Some(tick);
                break;
            }
        }
        let secs = lapsed_at.unwrap() as f32 * DT;
        assert!((secs - 1.0).abs() <= DT + 1e-4, "lapsed at {secs}");
        assert!(!a.is_aggroed());
        assert_eq!(a.target(), None);
    }

    #[test]
    fn reach_doubles_then_restores() {
        let (mut a, mut s, _) = aggroed_on_survivor();
        assert_eq!(s.config.view_cone_length, 14.0);
        assert_eq!(s.config.view_cone_angle, 180.0);

        a.set_target(SURVIVOR, &mut s);
        assert_eq!(s.config.view_cone_length, 14.0, "boost applies once");

        a.on_lost(SURVIVOR);
        while a.update(DT, false, &mut s).is_none() {}
        assert_eq!(s.config.view_cone_length, 7.0);
        assert_eq!(s.config.view_cone_angle, 90.0);
    }

    #[test]
    fn retargets_only_on_strictly_higher_priority() {
        let (mut a, mut s, mut reg) = aggroed_on_survivor();
        assert!(a.on_detected(Faction::Horde, SURVIVOR_2, &reg, &mut s).is_empty());
        assert_eq!(a.target(), Some(SURVIVOR));

        reg.register(SURVIVOR_2, Sensable::new(Faction::Survivor).with_priority(0.9));
        let effects = a.on_detected(Faction::Horde, SURVIVOR_2, &reg, &mut s);
        assert_eq!(effects, vec![AggroEffect::Targeted { target: SURVIVOR_2 }]);
        assert_eq!(a.target(), Some(SURVIVOR_2));
    }

    #[test]
    fn friends_never_aggro() {
        let reg = registry();
        let mut s = sensing();
        let mut a = Aggro::new(AggroConfig::default());
        assert!(a.on_detected(Faction::Horde, ZOMBIE_2, &reg, &mut s).is_empty());
        assert!(a.on_detected(Faction::Horde, EntityId(99), &reg, &mut s).is_empty());
        assert!(!a.is_aggroed());
    }

    #[test]
    fn horde_forces_aggro_until_it_ends() {
        let mut s = sensing();
        let mut a = Aggro::new(AggroConfig::default());
        for _ in 0..500 {
            assert_eq!(a.update(DT, true, &mut s), None);
        }
        assert!(a.is_aggroed());
        assert_eq!(s.config.view_cone_length, 7.0, "forced aggro does not boost");

        let mut lost = None;
        for _ in 0..100 {
            lost = lost.or(a.update(DT, false, &mut s));
        }
        assert_eq!(lost, Some(AggroEffect::Lost { target: None }));
        assert_eq!(s.config.view_cone_length, 7.0);
    }
}

// ── Perception ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod perception {
    use super::*;

    #[test]
    fn registration_order_is_checked() {
        let mut p = Perception::new(0);
        assert!(p.add_sensing(ZOMBIE, SensingConfig::default()).is_err());
        p.add_sensable(ZOMBIE, Sensable::new(Faction::Horde));
        assert!(p.add_aggro(ZOMBIE, AggroConfig::default()).is_err());
        p.add_sensing(ZOMBIE, SensingConfig::default()).unwrap();
        p.add_aggro(ZOMBIE, AggroConfig::default()).unwrap();
    }

    #[test]
    fn first_sight_triggers_aggro_event() {
        let (mut p, world) = perception_scene();
        let changes = p.tick(DT, false, world.sense());
        let effects: Vec<AggroEffect> = changes.iter().map(|c| c.effect).collect();
        assert_eq!(
            effects,
            vec![
                AggroEffect::Triggered { target: SURVIVOR },
                AggroEffect::Targeted { target: SURVIVOR },
            ]
        );
        let events = p.aggro_triggered.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, ZOMBIE);
        assert_eq!(events[0].1.target, SURVIVOR);
        assert_eq!(p.aggroed_count(), 1);
    }

    #[test]
    fn hearing_range_is_strict() {
        let (mut p, mut world) = perception_scene();
        world.positions.insert(ZOMBIE_2, Vec3::new(0.0, 0.0, -8.0));
        p.add_sensable(ZOMBIE_2, Sensable::new(Faction::Horde));
        p.add_sensing(ZOMBIE_2, SensingConfig::default()).unwrap();

        let reached = p.report_hearing_event(SURVIVOR, 8.0, Vec3::ZERO, &world.positions);
        assert_eq!(reached, 1);
        assert!(p.sensing(ZOMBIE).unwrap().pending().contains(&SURVIVOR));
        assert!(p.sensing(ZOMBIE_2).unwrap().pending().is_empty());
    }

    #[test]
    fn group_sense_filters_faction() {
        let (mut p, mut world) = perception_scene();
        world.positions.insert(SURVIVOR_2, Vec3::new(1.0, 0.0, 0.0));
        p.add_sensable(SURVIVOR_2, Sensable::new(Faction::Survivor));
        p.add_sensing(SURVIVOR_2, SensingConfig::default()).unwrap();

        let reached =
            p.report_group_sense_event(SURVIVOR, 10.0, Vec3::ZERO, Faction::Horde, &world.positions);
        assert_eq!(reached, 1);
        assert!(p.sensing(SURVIVOR_2).unwrap().pending().is_empty());
    }

    #[test]
    fn damage_blames_closest_enemy() {
        let (mut p, mut world) = perception_scene();
        world.positions.insert(SURVIVOR_2, Vec3::new(0.0, 0.0, -4.0));
        p.add_sensable(SURVIVOR_2, Sensable::new(Faction::Survivor));
        world.positions.insert(ZOMBIE, Vec3::new(0.0, 0.0, -1.0));

        p.on_damaged(ZOMBIE, &world.positions);
        let pending = p.sensing(ZOMBIE).unwrap().pending();
        assert!(pending.contains(&SURVIVOR_2));
        assert!(!pending.contains(&SURVIVOR));
    }

    #[test]
    fn aggro_alerts_teammates() {
        let (mut p, mut world) = perception_scene();
        world.positions.insert(ZOMBIE_2, Vec3::new(0.0, 0.0, -8.0));
        p.add_sensable(ZOMBIE_2, Sensable::new(Faction::Horde));
        p.add_sensing(ZOMBIE_2, SensingConfig::default()).unwrap();
        p.add_aggro(ZOMBIE_2, AggroConfig::default()).unwrap();

        p.tick(DT, false, world.sense());
        assert_eq!(p.aggro(ZOMBIE_2).unwrap().target(), None, "alert lands after the pass");
        assert!(p.sensing(ZOMBIE_2).unwrap().pending().contains(&SURVIVOR));

        for _ in 0..12 {
            p.tick(DT, false, world.sense());
        }
        assert_eq!(p.aggro(ZOMBIE_2).unwrap().target(), Some(SURVIVOR));
    }

    #[test]
    fn removed_target_is_lost() {
        let (mut p, mut world) = perception_scene();
        p.tick(DT, false, world.sense());
        p.remove(SURVIVOR);
        world.positions.remove(&SURVIVOR);

        let mut lost = Vec::new();
        for _ in 0..120 {
            lost.extend(
                p.tick(DT, false, world.sense())
                    .into_iter()
                    .filter(|c| matches!(c.effect, AggroEffect::Lost { .. })),
            );
        }
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].effect, AggroEffect::Lost { target: Some(SURVIVOR) });
        assert_eq!(p.aggro_lost.drain().len(), 1);
        assert!(!p.aggro(ZOMBIE).unwrap().is_aggroed());
    }

    #[test]
    fn force_target_skips_trigger() {
        let (mut p, world) = perception_scene();
        let change = p.force_target(ZOMBIE, SURVIVOR, &world.positions).unwrap();
        assert_eq!(change.effect, AggroEffect::Targeted { target: SURVIVOR });
        assert!(p.aggro_triggered.is_empty());
        assert!(p.force_target(SURVIVOR, ZOMBIE, &world.positions).is_none());
    }

    #[test]
    fn locator_forward_defaults_to_plus_z() {
        let world = World::default().with(ZOMBIE, Vec3::ZERO);
        assert_eq!(world.positions.forward(ZOMBIE), Some(Vec3::Z));
    }
}
