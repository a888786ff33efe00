//! Unit tests for hz-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EntityId, NodeId, PartitionId};

    #[test]
    fn index_roundtrip() {
        let id = EntityId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(EntityId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(EntityId::INVALID.0, u32::MAX);
        assert_eq!(PartitionId::INVALID.0, u16::MAX);
        assert!(!NodeId::default().is_valid());
    }

    #[test]
    fn signed_node_ids() {
        assert_eq!(NodeId::from_signed(-1), Some(NodeId::INVALID));
        assert_eq!(NodeId::from_signed(12), Some(NodeId(12)));
        assert_eq!(NodeId::INVALID.to_signed(), -1);
        assert_eq!(NodeId(3).to_signed(), 3);
    }

    #[test]
    fn display() {
        assert_eq!(EntityId(7).to_string(), "EntityId(7)");
    }
}

#[cfg(test)]
mod math {
    use crate::math::{jump_velocity, orthonormalize, right_of, rotate_towards, GRAVITY};
    use crate::Vec3;

    #[test]
    fn right_of_forward_z_is_x() {
        let r = right_of(Vec3::Z);
        assert!((r - Vec3::X).length() < 1e-5, "got {r}");
    }

    #[test]
    fn rotate_towards_clamps_angle() {
        let out = rotate_towards(Vec3::Z, Vec3::X, 0.1);
        let angle = Vec3::Z.angle_between(out);
        assert!((angle - 0.1).abs() < 1e-4, "angle {angle}");
        assert!((out.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotate_towards_snaps_when_close() {
        let out = rotate_towards(Vec3::Z * 2.0, Vec3::X, 10.0);
        assert!((out - Vec3::X * 2.0).length() < 1e-5);
    }

    #[test]
    fn orthonormalize_removes_normal_component() {
        let dir = orthonormalize(Vec3::Y, Vec3::new(1.0, 1.0, 0.0));
        assert!((dir - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn jump_reaches_peak_and_target() {
        let start = Vec3::ZERO;
        let end = Vec3::new(4.0, 0.0, 0.0);
        let v = jump_velocity(start, end, 2.0, 0.0);
        // v_y² = 2 g h
        assert!((v.y * v.y - 2.0 * GRAVITY * 2.0).abs() < 1e-3);
        let t = 2.0 * (2.0 * 2.0 / GRAVITY).sqrt();
        assert!((v.x * t - 4.0).abs() < 1e-3);
        assert!(v.z.abs() < 1e-6);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentRng, EntityId, SimRng};

    #[test]
    fn same_seed_same_stream() {
        let mut a = AgentRng::new(9, EntityId(3));
        let mut b = AgentRng::new(9, EntityId(3));
        for _ in 0..16 {
            assert_eq!(a.random::<u32>(), b.random::<u32>());
        }
    }

    #[test]
    fn empty_ranges_return_low_bound() {
        let mut r = SimRng::new(1);
        assert_eq!(r.range_f32(2.0, 2.0), 2.0);
        assert_eq!(r.range_i32(5, 3), 5);
        assert_eq!(r.index(0), None);
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let mut r = AgentRng::new(1, EntityId(0));
        for _ in 0..200 {
            let v = r.jitter(3.0, 1.0);
            assert!((2.0..=4.0).contains(&v), "got {v}");
        }
        assert_eq!(r.jitter(3.0, 0.0), 3.0);
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15) - Tick(10), 5u64);
    }

    #[test]
    fn clock_elapsed() {
        let mut clock = SimClock::new(0.5);
        clock.advance();
        clock.advance();
        assert!((clock.elapsed_secs() - 1.0).abs() < 1e-9);
        assert_eq!(clock.ticks_for_secs(1.2), 3);
    }

    #[test]
    fn config_end_tick() {
        let cfg = SimConfig { total_ticks: 10, ..SimConfig::default() };
        assert_eq!(cfg.end_tick(), Tick(10));
        assert_eq!(cfg.make_clock().current_tick, Tick::ZERO);
    }
}

#[cfg(test)]
mod events {
    use crate::{EntityId, EventChannel};

    #[test]
    fn unsubscribed_targets_drop_events() {
        let mut ch: EventChannel<u32> = EventChannel::new();
        assert!(!ch.publish(EntityId(1), 5));
        assert!(ch.is_empty());
    }

    #[test]
    fn drain_for_preserves_other_targets() {
        let mut ch = EventChannel::new();
        ch.subscribe(EntityId(1));
        ch.subscribe(EntityId(2));
        ch.publish(EntityId(1), "a");
        ch.publish(EntityId(2), "b");
        ch.publish(EntityId(1), "c");
        assert_eq!(ch.drain_for(EntityId(1)), vec!["a", "c"]);
        assert_eq!(ch.drain(), vec![(EntityId(2), "b")]);
    }

    #[test]
    fn unsubscribe_purges_pending() {
        let mut ch = EventChannel::new();
        ch.subscribe(EntityId(1));
        ch.publish(EntityId(1), 1u8);
        ch.unsubscribe(EntityId(1));
        assert!(ch.is_empty());
    }

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let mut ch = EventChannel::new();
        ch.subscribe(EntityId(4));
        ch.subscribe(EntityId(2));
        assert_eq!(ch.broadcast(&'x'), 2);
        assert_eq!(ch.drain(), vec![(EntityId(2), 'x'), (EntityId(4), 'x')]);
    }
}

#[cfg(test)]
mod faction {
    use crate::Faction;

    #[test]
    fn enemies_differ() {
        assert!(Faction::Horde.is_enemy_of(Faction::Survivor));
        assert!(!Faction::Horde.is_enemy_of(Faction::Horde));
        assert_eq!(Faction::Survivor.opposing(), Faction::Horde);
    }
}
