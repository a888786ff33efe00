//! Unit tests for hz-behavior.

use std::collections::BTreeMap;

use hz_core::{AgentRng, EntityId, NodeId, Vec3};
use hz_steering::{Body, SteeringConfig, SteeringController};

use crate::composite::{Parallel, PrioritySelect, Selector, Sequencer};
use crate::decorator::{InvertFinish, Repeat, RepeatForever};
use crate::leaf::{Brake, Idle, Melee, MoveTo, MoveToNavMesh, SetAnimParam};
use crate::{
    AgentActions, AnimParam, BehaviorError, BehaviorTree, Blackboard, Node, NodeIdx, NodeStatus,
    ShotRequest, TickContext, TreeBuilder,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DT: f32 = 0.02;
const ME: EntityId = EntityId(1);
const SURVIVOR: EntityId = EntityId(7);

/// Owner double that records every side effect as a short string.
struct Owner {
    steering:    SteeringController,
    positions:   BTreeMap<EntityId, Vec3>,
    log:         Vec<String>,
    shots:       Vec<ShotRequest>,
    anim_length: f32,
    walkable:    Option<Vec3>,
}

impl Owner {
    fn at(pos: Vec3) -> Self {
        let mut positions = BTreeMap::new();
        positions.insert(ME, pos);
        Self {
            steering: SteeringController::new(ME, Body::new(pos), SteeringConfig::default()),
            positions,
            log: Vec::new(),
            shots: Vec::new(),
            anim_length: 0.05,
            walkable: None,
        }
    }

    fn count(&self, entry: &str) -> usize {
        self.log.iter().filter(|l| *l == entry).count()
    }
}

impl AgentActions for Owner {
    fn steering(&self) -> &SteeringController {
        &self.steering
    }

    fn steering_mut(&mut self) -> &mut SteeringController {
        &mut self.steering
    }

    fn entities(&self) -> &dyn hz_core::EntityLocator {
        &self.positions
    }

    fn sample_walkable(&self, _near: Vec3, _max_dist: f32) -> Option<Vec3> {
        self.walkable
    }

    fn set_anim_param(&mut self, name: &str, _value: AnimParam) {
        self.log.push(format!("anim {name}"));
    }

    fn anim_state_length(&self) -> f32 {
        self.anim_length
    }

    fn melee_swing(&mut self) {
        self.log.push("swing".to_owned());
    }

    fn melee_cancel(&mut self) {
        self.log.push("cancel".to_owned());
    }

    fn shoot(&mut self, shot: ShotRequest) {
        self.shots.push(shot);
    }

    fn send_event(&mut self, target: Option<&str>, event: &str) {
        self.log.push(format!("event {} {event}", target.unwrap_or("self")));
    }
}

/// A tree plus everything needed to tick it.
struct Agent {
    tree:  BehaviorTree,
    bb:    Blackboard,
    owner: Owner,
    rng:   AgentRng,
}

impl Agent {
    fn new(tree: BehaviorTree) -> Self {
        Self {
            tree,
            bb: Blackboard::new().with("Target", crate::BbValue::Unset),
            owner: Owner::at(Vec3::ZERO),
            rng: AgentRng::new(42, ME),
        }
    }

    fn update(&mut self) -> Result<NodeStatus, BehaviorError> {
        let mut ctx = TickContext::new(DT, &mut self.bb, &mut self.owner, &mut self.rng);
        self.tree.update(&mut ctx)
    }

    fn signal(&mut self, signal: crate::Signal) -> bool {
        let mut ctx = TickContext::new(DT, &mut self.bb, &mut self.owner, &mut self.rng);
        self.tree.handle_signal(&signal, &mut ctx).unwrap()
    }

    fn status_of(&self, name: &str) -> NodeStatus {
        let ix = self.tree.find_by_name(name).unwrap();
        self.tree.node(ix).status()
    }
}

fn anim(name: &str) -> Node {
    Node::new(name, SetAnimParam { param_name: name.to_owned(), ..Default::default() })
}

/// `MoveTo` on the unset `Target` key: fails as soon as it is entered.
fn failing(name: &str) -> Node {
    Node::new(name, MoveTo { target_bb_key: "Target".to_owned(), move_speed: 0.0 })
}

fn idle(name: &str, seconds: f32) -> Node {
    Node::new(name, Idle { idle_time: seconds, idle_time_random: 0.0 })
}

/// Root plus a flat list of children.
fn flat(root: Node, children: Vec<Node>) -> BehaviorTree {
    let mut b = TreeBuilder::new("test", root);
    for child in children {
        b.child(NodeIdx(0), child);
    }
    b.build().unwrap()
}

// ── Composites ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod composites {
    use super::*;
    use crate::FinishMethod;

    #[test]
    fn sequencer_failure_skips_the_rest() {
        let tree = flat(Node::new("Root", Sequencer {}), vec![anim("a"), failing("b"), anim("c")]);
        let mut agent = Agent::new(tree);

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.update().unwrap(), NodeStatus::Fail);
        assert_eq!(agent.owner.count("anim c"), 0);
        // The root restarted after failing, so `a` ran twice.
        assert_eq!(agent.owner.count("anim a"), 2);
    }

    #[test]
    fn selector_enters_each_child_once() {
        let tree = flat(Node::new("Root", Selector {}), vec![failing("a"), anim("b"), anim("c")]);
        let mut agent = Agent::new(tree);

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.update().unwrap(), NodeStatus::Success);
        assert_eq!(agent.owner.count("anim b"), 1);
        assert_eq!(agent.owner.count("anim c"), 0);
    }

    #[test]
    fn parallel_first_finisher_cancels_siblings() {
        let tree = flat(
            Node::new("Root", Parallel { finish_method: FinishMethod::FirstChildToFinish }),
            vec![idle("wait", 10.0), Node::new("swing", Melee {}), anim("done")],
        );
        let mut agent = Agent::new(tree);

        assert_eq!(agent.update().unwrap(), NodeStatus::Success);
        assert_eq!(agent.owner.count("cancel"), 1);
        // Once at the start and once more when the root restarted.
        assert_eq!(agent.owner.count("swing"), 2);
    }

    #[test]
    fn parallel_waits_for_all_children() {
        let tree = flat(
            Node::new("Root", Parallel { finish_method: FinishMethod::WaitForAllChildren }),
            vec![idle("wait", 0.03), anim("done")],
        );
        let mut agent = Agent::new(tree);

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.update().unwrap(), NodeStatus::Success);
    }

    #[test]
    fn parallel_fails_on_any_failure() {
        let tree = flat(
            Node::new("Root", Parallel { finish_method: FinishMethod::WaitForAllChildren }),
            vec![idle("wait", 10.0), failing("bad")],
        );
        let mut agent = Agent::new(tree);

        assert_eq!(agent.update().unwrap(), NodeStatus::Fail);
    }

    #[test]
    fn priority_select_skips_impulse_receivers() {
        let mut b = TreeBuilder::new("test", Node::new("Root", PrioritySelect {}));
        let receiver = b.child(
            NodeIdx(0),
            Node::new(
                "listen",
                crate::decorator::ImpulseReceiver {
                    target_node_id:        5,
                    impulse_to_respond_to: "Alert".to_owned(),
                    ..Default::default()
                },
            ),
        );
        b.child(receiver, anim("alerted").with_id(5));
        b.child(NodeIdx(0), idle("loiter", 10.0));
        let mut agent = Agent::new(b.build().unwrap());

        agent.update().unwrap();
        assert_eq!(agent.status_of("loiter"), NodeStatus::Running);
        assert_eq!(agent.owner.count("anim alerted"), 0);
    }
}

// ── Decorators ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod decorators {
    use super::*;
    use crate::decorator::{Conditional, ConditionalConstant, DistanceCheck};
    use crate::{BbValue, ConditionalType};

    #[test]
    fn repeat_forever_reenters_child() {
        let mut agent = Agent::new(flat(Node::new("Root", RepeatForever {}), vec![anim("x")]));
        for _ in 0..3 {
            assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        }
        assert_eq!(agent.owner.count("anim x"), 4);
    }

    #[test]
    fn repeat_stops_after_count() {
        let mut agent = Agent::new(flat(Node::new("Root", Repeat { repetitions: 3 }), vec![anim("x")]));
        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.update().unwrap(), NodeStatus::Success);
        // Three runs, then the restarted root entered the child once more.
        assert_eq!(agent.owner.count("anim x"), 4);
    }

    #[test]
    fn repeat_fails_with_child() {
        let mut agent = Agent::new(flat(Node::new("Root", Repeat { repetitions: 3 }), vec![failing("x")]));
        assert_eq!(agent.update().unwrap(), NodeStatus::Fail);
    }

    #[test]
    fn invert_swaps_terminal_status() {
        let mut agent = Agent::new(flat(Node::new("Root", InvertFinish {}), vec![failing("x")]));
        assert_eq!(agent.update().unwrap(), NodeStatus::Success);

        let mut agent = Agent::new(flat(Node::new("Root", InvertFinish {}), vec![Node::new("b", Brake {})]));
        assert_eq!(agent.update().unwrap(), NodeStatus::Fail);
    }

    #[test]
    fn always_succeed_immediately_cancels_child() {
        let root = Node::new("Root", crate::decorator::AlwaysSucceed { only_succeed_on_finish: false });
        let mut agent = Agent::new(flat(root, vec![Node::new("swing", Melee {})]));
        assert_eq!(agent.update().unwrap(), NodeStatus::Success);
        assert_eq!(agent.owner.count("cancel"), 1);
    }

    #[test]
    fn conditional_rejects_mixed_types() {
        let root = Node::new(
            "Check",
            Conditional {
                bb_key1:          "Speed".to_owned(),
                bb_key2:          "Count".to_owned(),
                conditional_type: ConditionalType::LessThan,
            },
        );
        let mut agent = Agent::new(flat(root, vec![anim("x")]));
        agent.bb.declare("Speed", 1.5_f32);
        agent.bb.declare("Count", 3_i32);

        let err = agent.update().unwrap_err();
        assert!(matches!(err, BehaviorError::InvalidComparison { ref node, .. } if node == "Check"));
    }

    #[test]
    fn conditional_constant_truncates_for_ints() {
        let root = Node::new(
            "Check",
            ConditionalConstant {
                bb_key1:          "Count".to_owned(),
                conditional_type: ConditionalType::Equal,
                comparison_value: 3.7,
            },
        );
        let mut agent = Agent::new(flat(root, vec![anim("x")]));
        agent.bb.declare("Count", 3_i32);

        agent.update().unwrap();
        assert_eq!(agent.owner.count("anim x"), 1);

        agent.bb.set("Count", 4_i32).unwrap();
        let mut agent2 = Agent::new(agent.tree.deep_copy());
        agent2.bb = agent.bb.clone();
        assert_eq!(agent2.update().unwrap(), NodeStatus::Fail);
        assert_eq!(agent2.owner.count("anim x"), 0);
    }

    #[test]
    fn distance_check_drops_child_when_target_leaves() {
        let root = Node::new(
            "Near",
            DistanceCheck {
                target_blackboard_entry: "Target".to_owned(),
                distance: 5.0,
                ..Default::default()
            },
        );
        let mut agent = Agent::new(flat(root, vec![Node::new("swing", Melee {})]));
        agent.owner.positions.insert(SURVIVOR, Vec3::new(3.0, 0.0, 0.0));
        agent.bb.set("Target", SURVIVOR).unwrap();

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.owner.count("swing"), 1);

        agent.owner.positions.insert(SURVIVOR, Vec3::new(30.0, 0.0, 0.0));
        assert_eq!(agent.update().unwrap(), NodeStatus::Fail);
        assert_eq!(agent.owner.count("cancel"), 1);
    }

    #[test]
    fn distance_check_height_limit() {
        let mut check = DistanceCheck {
            target_blackboard_entry:                  "Target".to_owned(),
            distance:                                 5.0,
            invalidate_if_too_much_height_difference: true,
            fail_on_height_difference:                true,
            ..Default::default()
        };
        let mut owner = Owner::at(Vec3::ZERO);
        let mut bb = Blackboard::new().with("Target", BbValue::Vec3(Vec3::new(1.0, 8.0, 0.0)));
        let mut rng = AgentRng::new(1, ME);
        let ctx = TickContext::new(DT, &mut bb, &mut owner, &mut rng);
        assert!(matches!(check.gate(&ctx).unwrap(), crate::decorator::Gate::Block));

        check.fail_on_height_difference = false;
        assert!(matches!(check.gate(&ctx).unwrap(), crate::decorator::Gate::Pass));
    }
}

// ── Leaves and signals ────────────────────────────────────────────────────────

#[cfg(test)]
mod leaves {
    use super::*;
    use crate::leaf::{PlayAnim, SendEvent, Shoot, SteerTo};
    use crate::{BbValue, Signal};
    use hz_steering::{LookMode, OrientTarget};

    #[test]
    fn move_then_animate_on_arrival() {
        let target = Vec3::new(20.0, 0.0, 0.0);
        let tree = flat(
            Node::new("Root", Sequencer {}),
            vec![
                Node::new("go", MoveTo { target_bb_key: "Target".to_owned(), move_speed: 0.0 }),
                Node::new("cheer", PlayAnim { param_name: "cheer".to_owned(), ..Default::default() }),
            ],
        );
        let mut agent = Agent::new(tree);
        agent.bb.set("Target", target).unwrap();

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.owner.steering.pending_destination(), Some(target));
        assert_eq!(agent.status_of("go"), NodeStatus::Running);

        assert!(agent.signal(Signal::Arrived { destination: target }));
        assert_eq!(agent.status_of("go"), NodeStatus::Success);

        agent.update().unwrap();
        assert_eq!(agent.owner.count("anim cheer"), 1);
        assert_eq!(agent.status_of("cheer"), NodeStatus::Running);

        // 0.05 s of animation at 0.02 s per tick.
        let mut finished = None;
        for _ in 0..4 {
            if agent.update().unwrap() == NodeStatus::Success {
                finished = Some(());
                break;
            }
        }
        assert!(finished.is_some());
    }

    #[test]
    fn move_to_succeeds_when_already_near() {
        let tree = flat(
            Node::new("Root", Sequencer {}),
            vec![Node::new("go", MoveTo { target_bb_key: "Target".to_owned(), move_speed: 0.0 }), idle("rest", 10.0)],
        );
        let mut agent = Agent::new(tree);
        agent.bb.set("Target", Vec3::new(0.1, 0.0, 0.0)).unwrap();
        agent.update().unwrap();
        assert_eq!(agent.status_of("go"), NodeStatus::Success);
        assert_eq!(agent.owner.steering.pending_destination(), None);
    }

    #[test]
    fn move_to_navmesh_arrives_within_half_height() {
        // Default body height 2: arrival reach is 1.2 m.
        let navmesh = || flat(Node::new("Root", Sequencer {}), vec![Node::new("land", MoveToNavMesh {}), idle("rest", 10.0)]);

        let mut agent = Agent::new(navmesh());
        agent.owner.walkable = Some(Vec3::new(1.15, 0.0, 0.0));
        agent.update().unwrap();
        assert_eq!(agent.status_of("land"), NodeStatus::Success);

        let mut agent = Agent::new(navmesh());
        agent.owner.walkable = Some(Vec3::new(1.5, 0.0, 0.0));
        agent.update().unwrap();
        assert_eq!(agent.status_of("land"), NodeStatus::Running);
    }

    #[test]
    fn move_to_navmesh_fails_without_walkable_ground() {
        let mut agent = Agent::new(flat(Node::new("Root", Selector {}), vec![Node::new("land", MoveToNavMesh {})]));
        agent.update().unwrap();
        assert_eq!(agent.status_of("land"), NodeStatus::Fail);
    }

    #[test]
    fn signals_ignore_idle_leaves() {
        let mut agent = Agent::new(flat(Node::new("Root", Sequencer {}), vec![idle("rest", 10.0)]));
        agent.update().unwrap();
        assert!(!agent.signal(Signal::MeleeFinished));
        assert!(!agent.signal(Signal::Arrived { destination: Vec3::ZERO }));
    }

    #[test]
    fn melee_finishes_on_signal() {
        let mut agent = Agent::new(flat(Node::new("Root", Sequencer {}), vec![Node::new("swing", Melee {}), anim("after")]));
        agent.update().unwrap();
        assert!(agent.signal(Signal::MeleeFinished));
        agent.update().unwrap();
        assert_eq!(agent.owner.count("anim after"), 1);
        assert_eq!(agent.owner.count("cancel"), 0);
    }

    #[test]
    fn undeclared_key_is_an_error() {
        let tree = flat(
            Node::new("Root", Sequencer {}),
            vec![Node::new("go", MoveTo { target_bb_key: "Nowhere".to_owned(), move_speed: 0.0 })],
        );
        let mut agent = Agent::new(tree);
        let err = agent.update().unwrap_err();
        assert!(matches!(err, BehaviorError::UndeclaredKey { ref key } if key == "Nowhere"));
    }

    #[test]
    fn shoot_reads_target_and_projectile() {
        let tree = flat(
            Node::new("Root", Sequencer {}),
            vec![Node::new(
                "spit",
                Shoot { bb_projectile_key: "Spit".to_owned(), num_shots: 2, ..Default::default() },
            )],
        );
        let mut agent = Agent::new(tree);
        agent.bb.set("Target", Vec3::new(4.0, 0.0, 4.0)).unwrap();
        agent.bb.declare("Spit", BbValue::Text("acid".to_owned()));

        assert_eq!(agent.update().unwrap(), NodeStatus::Success);
        let shot = &agent.owner.shots[0];
        assert_eq!(shot.target, Vec3::new(4.0, 0.0, 4.0));
        assert_eq!(shot.projectile.as_deref(), Some("acid"));
        assert_eq!(shot.num_shots, 2);
        assert!(shot.arc.is_none());
    }

    #[test]
    fn steer_to_tracks_entity_and_brakes_on_exit() {
        let mut b = TreeBuilder::new("steer", Node::new("Root", Sequencer {}));
        let burst = b.child(NodeIdx(0), Node::new("burst", Parallel::default()));
        b.child(burst, Node::new("chase", SteerTo { target_bb_key: "Target".to_owned(), ..Default::default() }));
        b.child(burst, idle("budget", 0.03));
        b.child(NodeIdx(0), idle("rest", 10.0));
        let mut agent = Agent::new(b.build().unwrap());
        agent.owner.positions.insert(SURVIVOR, Vec3::new(10.0, 0.0, 5.0));
        agent.bb.set("Target", SURVIVOR).unwrap();

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        let steering = &agent.owner.steering;
        assert_eq!(steering.pending_destination(), Some(Vec3::new(10.0, 0.0, 5.0)));
        assert_eq!(steering.look_mode(), LookMode::AlongPath);
        assert!(matches!(steering.orient.target, OrientTarget::Entity { entity, .. } if entity == SURVIVOR));

        // The idle budget runs out; the parallel cancels the steer.
        agent.update().unwrap();
        assert_eq!(agent.status_of("burst"), NodeStatus::Success);
        assert_eq!(agent.status_of("chase"), NodeStatus::Fail);
        assert!(agent.owner.steering.is_braking());
    }

    #[test]
    fn send_event_names_target() {
        let tree = flat(
            Node::new("Root", Sequencer {}),
            vec![
                Node::new("ring", SendEvent { event_name: "Open".to_owned(), target_name: "Gate".to_owned() }),
                idle("rest", 10.0),
            ],
        );
        let mut agent = Agent::new(tree);
        agent.update().unwrap();
        assert_eq!(agent.owner.count("event Gate Open"), 1);
    }
}

// ── Tree structure ────────────────────────────────────────────────────────────

#[cfg(test)]
mod structure {
    use super::*;
    use crate::decorator::ImpulseReceiver;
    use crate::Signal;

    /// `PrioritySelect[ImpulseReceiver(Alert → 5)[alerted#5], loiter]`.
    fn alert_tree() -> BehaviorTree {
        let mut b = TreeBuilder::new("alert", Node::new("Root", PrioritySelect {}).with_id(1));
        let receiver = b.child(
            NodeIdx(0),
            Node::new(
                "listen",
                ImpulseReceiver {
                    target_node_id:        5,
                    impulse_to_respond_to: "Alert".to_owned(),
                    ..Default::default()
                },
            )
            .with_id(2),
        );
        b.child(receiver, idle("alerted", 10.0).with_id(5));
        b.child(NodeIdx(0), idle("loiter", 10.0).with_id(3));
        b.build().unwrap()
    }

    #[test]
    fn impulse_jumps_to_target() {
        let mut agent = Agent::new(alert_tree());
        agent.update().unwrap();
        assert_eq!(agent.status_of("loiter"), NodeStatus::Running);

        assert!(agent.signal(Signal::impulse("Alert")));
        assert_eq!(agent.status_of("loiter"), NodeStatus::Fail);
        assert_eq!(agent.status_of("alerted"), NodeStatus::Running);
        assert_eq!(agent.status_of("listen"), NodeStatus::Running);

        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.status_of("alerted"), NodeStatus::Running);
    }

    #[test]
    fn impulse_from_other_source_is_ignored() {
        let mut agent = Agent::new(alert_tree());
        agent.update().unwrap();
        assert!(!agent.signal(Signal::impulse_from("Door", "Alert")));
        assert!(!agent.signal(Signal::impulse("Other")));
        assert_eq!(agent.status_of("loiter"), NodeStatus::Running);
    }

    #[test]
    fn impulse_path_runs_root_to_target() {
        let tree = alert_tree();
        let path: Vec<NodeId> = tree
            .impulse_path(NodeId(5))
            .unwrap()
            .iter()
            .map(|&ix| tree.node(ix).id)
            .collect();
        assert_eq!(path, vec![NodeId(1), NodeId(2), NodeId(5)]);
    }

    #[test]
    fn deep_copy_is_isomorphic_and_independent() {
        let original = alert_tree();
        let mut agent = Agent::new(original.deep_copy());

        assert_eq!(agent.tree.outline(), original.outline());
        let copied_path: Vec<NodeId> = agent
            .tree
            .impulse_path(NodeId(5))
            .unwrap()
            .iter()
            .map(|&ix| agent.tree.node(ix).id)
            .collect();
        assert_eq!(copied_path, vec![NodeId(1), NodeId(2), NodeId(5)]);

        agent.update().unwrap();
        assert_eq!(agent.status_of("loiter"), NodeStatus::Running);
        assert_eq!(original.status(), NodeStatus::Entering);
        assert_ne!(agent.tree.outline(), original.outline());
    }

    #[test]
    fn deep_copy_handles_deep_chains() {
        let mut b = TreeBuilder::new("deep", Node::new("Root", RepeatForever {}));
        let mut at = NodeIdx(0);
        for i in 0..5_000 {
            at = b.child(at, Node::new(format!("inv{i}"), InvertFinish {}));
        }
        b.child(at, anim("leaf"));
        let tree = b.build().unwrap();
        let copy = tree.deep_copy();
        assert_eq!(copy.len(), tree.len());
        assert!(copy.find_by_name("leaf").is_some());
    }

    #[test]
    fn find_by_id_uses_preorder() {
        let tree = alert_tree();
        let ix = tree.find_by_id(NodeId(3)).unwrap();
        assert_eq!(tree.node(ix).name, "loiter");
        assert!(tree.find_by_id(NodeId(99)).is_none());
        assert!(tree.find_by_id(NodeId::INVALID).is_none());
    }

    #[test]
    fn builder_rejects_missing_impulse_target() {
        let mut b = TreeBuilder::new("bad", Node::new("Root", Selector {}));
        let receiver = b.child(
            NodeIdx(0),
            Node::new("listen", ImpulseReceiver { target_node_id: 42, ..Default::default() }),
        );
        b.child(receiver, anim("x"));
        let err = b.build().unwrap_err();
        assert!(matches!(err, BehaviorError::ImpulseTargetMissing { target: 42, .. }));
    }

    #[test]
    fn builder_checks_arity() {
        let b = TreeBuilder::new("bad", Node::new("Root", Sequencer {}));
        assert!(matches!(b.build().unwrap_err(), BehaviorError::Arity { got: 0, .. }));

        let mut b = TreeBuilder::new("bad", Node::new("Root", InvertFinish {}));
        b.child(NodeIdx(0), anim("a"));
        b.child(NodeIdx(0), anim("b"));
        assert!(matches!(b.build().unwrap_err(), BehaviorError::Arity { got: 2, .. }));

        let mut b = TreeBuilder::new("bad", anim("Root"));
        b.child(NodeIdx(0), anim("a"));
        assert!(matches!(b.build().unwrap_err(), BehaviorError::Arity { got: 1, .. }));
    }

    #[test]
    fn builder_rejects_shared_node_ids() {
        let mut b = TreeBuilder::new("bad", Node::new("Root", Sequencer {}).with_id(1));
        b.child(NodeIdx(0), idle("first", 1.0).with_id(7));
        b.child(NodeIdx(0), idle("second", 1.0).with_id(7));
        let err = b.build().unwrap_err();
        assert!(matches!(
            err,
            BehaviorError::DuplicateNodeId { id: 7, ref first, ref second } if first == "first" && second == "second"
        ));
    }

    #[test]
    fn unassigned_ids_may_repeat() {
        let tree = flat(Node::new("Root", Sequencer {}), vec![idle("a", 1.0), idle("b", 1.0), idle("c", 1.0)]);
        assert_eq!(tree.len(), 4);
    }
}

// ── Asset codec ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod asset {
    use super::*;
    use crate::asset::element_name;
    use crate::leaf::{ChangeColor, SetSteeringParameters};
    use crate::{parse_tree, write_tree, BehaviorAsset, NodeKind};
    use hz_steering::LookMode;

    const CHASER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<BehaviorTree>
  <Root Type="SEL_Sequencer" Name="Root" ID="0">
    <param Editor="x"><Nested Type="nonsense"/></param>
    <Setup Type="LEF_SetSteeringParameters" Name="Setup" ID="1" LookMode="TowardsTarget" MaxSpeed="8.5" Legacy="1"/>
    <Loop Type="DEC_Repeat" Name="Loop" ID="2" Repetitions="">
      <Chase Type="LEF_MoveTo" Name="Chase" ID="3" TargetBBKey="Target" MoveSpeed="30"/>
    </Loop>
  </Root>
</BehaviorTree>"#;

    #[test]
    fn parses_nodes_fields_and_nesting() {
        let tree = parse_tree("chaser", CHASER).unwrap();
        assert_eq!(tree.len(), 4);

        let setup = tree.node(tree.find_by_name("Setup").unwrap());
        let NodeKind::SetSteeringParameters(p) = &setup.kind else { panic!("wrong kind") };
        assert_eq!(p.look_mode, LookMode::TowardsTarget);
        assert_eq!(p.max_speed, 8.5);
        assert_eq!(p.move_speed, SetSteeringParameters::default().move_speed);

        // Empty attribute keeps the default.
        let repeat = tree.node(tree.find_by_id(NodeId(2)).unwrap());
        assert!(matches!(&repeat.kind, NodeKind::Repeat(r) if r.repetitions == 3));
        assert_eq!(repeat.children().len(), 1);

        let chase = tree.node(tree.find_by_name("Chase").unwrap());
        assert_eq!(chase.parent(), tree.find_by_name("Loop"));
    }

    #[test]
    fn round_trip_preserves_structure() {
        let mut b = TreeBuilder::new("colors", Node::new("Root", Sequencer {}).with_id(0));
        b.child(NodeIdx(0), Node::new("Turn Red", ChangeColor { to_change_to: hz_core::Color::RED }).with_id(1));
        b.child(NodeIdx(0), Node::new("1st", Idle { idle_time: 0.25, idle_time_random: 0.0 }));
        let tree = b.build().unwrap();

        let xml = write_tree(&tree).unwrap();
        assert!(xml.contains("<Turn_Red Type=\"LEF_ChangeColor\""));
        assert!(xml.contains("<LEF_Idle Type=\"LEF_Idle\" Name=\"1st\" ID=\"-1\""));

        let back = parse_tree("colors", &xml).unwrap();
        assert_eq!(back.outline(), tree.outline());
        for (a, b) in tree.preorder().into_iter().zip(back.preorder()) {
            assert_eq!(tree.node(a).kind, back.node(b).kind);
            assert_eq!(tree.node(a).id, back.node(b).id);
        }
    }

    #[test]
    fn element_names_fall_back_to_type() {
        assert_eq!(element_name(&anim("Look around")), "Look_around");
        assert_eq!(element_name(&anim("Root")), "LEF_SetAnimParam");
        assert_eq!(element_name(&anim("param")), "LEF_SetAnimParam");
        assert_eq!(element_name(&anim("")), "LEF_SetAnimParam");
        assert_eq!(element_name(&anim("_x")), "LEF_SetAnimParam");
    }

    #[test]
    fn rejects_unknown_type() {
        let xml = r#"<BehaviorTree><Root Type="SEL_Bogus" Name="Root"/></BehaviorTree>"#;
        assert!(matches!(parse_tree("t", xml).unwrap_err(), BehaviorError::UnknownNodeType(t) if t == "SEL_Bogus"));
    }

    #[test]
    fn rejects_malformed_values() {
        let xml = r#"<BehaviorTree><Root Type="LEF_Idle" Name="Wait" IdleTime="soon"/></BehaviorTree>"#;
        let err = parse_tree("t", xml).unwrap_err();
        assert!(matches!(err, BehaviorError::MalformedAttribute { ref attribute, .. } if attribute == "IdleTime"));
    }

    #[test]
    fn rejects_repeated_ids() {
        let xml = r#"<BehaviorTree>
  <Root Type="SEL_Sequencer" Name="Root" ID="0">
    <A Type="LEF_Idle" Name="A" ID="7"/>
    <B Type="LEF_Idle" Name="B" ID="7"/>
  </Root>
</BehaviorTree>"#;
        assert!(matches!(parse_tree("t", xml).unwrap_err(), BehaviorError::DuplicateNodeId { id: 7, .. }));

        let unassigned = xml.replace("ID=\"7\"", "ID=\"-1\"");
        assert_eq!(parse_tree("t", &unassigned).unwrap().len(), 3);
    }

    #[test]
    fn requires_root() {
        let xml = r#"<BehaviorTree><Other Type="LEF_Idle"/></BehaviorTree>"#;
        assert!(matches!(parse_tree("t", xml).unwrap_err(), BehaviorError::MissingRoot));
    }

    #[test]
    fn bools_are_case_insensitive() {
        let xml = r#"<BehaviorTree><Root Type="DEC_AlwaysSucceed" OnlySucceedOnFinish="false"><X Type="LEF_Brake"/></Root></BehaviorTree>"#;
        let tree = parse_tree("t", xml).unwrap();
        assert!(matches!(&tree.node(tree.root()).kind, NodeKind::AlwaysSucceed(a) if !a.only_succeed_on_finish));
    }

    #[test]
    fn load_file_and_instantiate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaser.xml");
        std::fs::write(&path, CHASER).unwrap();

        let asset = BehaviorAsset::load_file(&path).unwrap();
        assert_eq!(asset.name(), "chaser");

        let mut agent = Agent::new(asset.instantiate());
        agent.bb.set("Target", Vec3::new(50.0, 0.0, 0.0)).unwrap();
        assert_eq!(agent.update().unwrap(), NodeStatus::Running);
        assert_eq!(agent.owner.steering.config.max_speed, 8.5);
        assert_eq!(asset.prototype().status(), NodeStatus::Entering);

        let saved = dir.path().join("saved.xml");
        asset.save_file(&saved).unwrap();
        let reloaded = BehaviorAsset::load_file(&saved).unwrap();
        assert_eq!(reloaded.prototype().outline(), asset.prototype().outline());
    }
}
