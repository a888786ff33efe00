//! Node lifecycle dispatch.
//!
//! Every node moves through `Entering → Running → Success | Fail`.  The
//! functions here route each transition to the composite, decorator, or leaf
//! that owns it; the per-type logic lives in those modules.

use crate::composite::weighted_pick;
use crate::decorator::Gate;
use crate::kind::Category;
use crate::node::Scratch;
use crate::{leaf, BehaviorResult, BehaviorTree, Node, NodeIdx, NodeKind, NodeStatus, TickContext};

impl BehaviorTree {
    // ── Arena access ──────────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn node_mut(&mut self, ix: NodeIdx) -> &mut Node {
        &mut self.nodes[ix.index()]
    }

    #[inline]
    pub(crate) fn child_at(&self, ix: NodeIdx, k: usize) -> NodeIdx {
        self.nodes[ix.index()].children[k]
    }

    #[inline]
    pub(crate) fn child_count(&self, ix: NodeIdx) -> usize {
        self.nodes[ix.index()].children.len()
    }

    /// Mark `ix` running with `index` as its active child.
    pub(crate) fn begin(&mut self, ix: NodeIdx, index: usize) {
        let node = self.node_mut(ix);
        node.scratch.index = index;
        node.status = NodeStatus::Running;
    }

    pub(crate) fn finish(&mut self, ix: NodeIdx, status: NodeStatus) -> NodeStatus {
        self.node_mut(ix).status = status;
        status
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Assign a status.  Assigning `Entering` runs the node's entry at once
    /// and returns whatever status entry left behind.
    pub(crate) fn set_status(
        &mut self,
        ix:     NodeIdx,
        status: NodeStatus,
        ctx:    &mut TickContext<'_>,
    ) -> BehaviorResult<NodeStatus> {
        if status != NodeStatus::Entering {
            return Ok(self.finish(ix, status));
        }
        self.enter(ix, ctx)?;
        Ok(self.node(ix).status)
    }

    /// Entry: reset transient state and start the node.
    pub(crate) fn enter(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
        {
            let node = self.node_mut(ix);
            node.scratch = Scratch::default();
            node.status = NodeStatus::Running;
        }
        let node = &self.nodes[ix.index()];
        match &node.kind {
            NodeKind::Sequencer(_) => self.enter_sequencer(ix, ctx),
            NodeKind::Selector(_) => self.enter_picked(ix, 0, ctx),
            NodeKind::Parallel(_) => self.enter_parallel(ix, ctx),
            NodeKind::PrioritySelect(_) => {
                let pick = self.highest_utility_child(ix);
                self.enter_picked(ix, pick, ctx)
            }
            NodeKind::RandomSelector(p) => {
                let pick = weighted_pick(p.left_weight, p.right_weight, ctx.rng);
                self.enter_picked(ix, pick, ctx)
            }
            NodeKind::RepeatForTime(p) => {
                let timer = ctx.rng.jitter(p.repeat_time, p.time_random);
                self.node_mut(ix).scratch.timer = timer;
                self.enter_only_child(ix, ctx)
            }
            NodeKind::Conditional(c) => {
                let pass = c.check(&node.name, ctx.blackboard)?;
                self.enter_gated(ix, pass, ctx)
            }
            NodeKind::ConditionalConstant(c) => {
                let pass = c.check(&node.name, ctx.blackboard)?;
                self.enter_gated(ix, pass, ctx)
            }
            NodeKind::DistanceCheck(c) => {
                let pass = matches!(c.gate(ctx)?, Gate::Pass);
                self.enter_gated(ix, pass, ctx)
            }
            kind => match kind.category() {
                Category::Leaf => leaf::enter(&mut self.nodes[ix.index()], ctx),
                _ => self.enter_only_child(ix, ctx),
            },
        }
    }

    fn enter_only_child(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
        self.begin(ix, 0);
        let child = self.child_at(ix, 0);
        self.enter(child, ctx)
    }

    /// One update.  A node still `Entering` is entered first; a terminal
    /// node just reports its status.
    pub(crate) fn tick(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        match self.node(ix).status {
            NodeStatus::Entering => {
                if self.set_status(ix, NodeStatus::Entering, ctx)?.is_terminal() {
                    return Ok(self.node(ix).status);
                }
            }
            s if s.is_terminal() => return Ok(s),
            _ => {}
        }

        let node = &self.nodes[ix.index()];
        match &node.kind {
            NodeKind::Sequencer(_) => self.update_sequencer(ix, ctx),
            NodeKind::Selector(_) => self.update_selector(ix, ctx),
            NodeKind::Parallel(p) => {
                let method = p.finish_method;
                self.update_parallel(ix, method, ctx)
            }
            NodeKind::PrioritySelect(_) | NodeKind::RandomSelector(_) => self.update_picked(ix, ctx),
            NodeKind::AlwaysSucceed(p) => {
                let only_on_finish = p.only_succeed_on_finish;
                self.update_always_succeed(ix, only_on_finish, ctx)
            }
            NodeKind::InvertFinish(_) => self.update_invert(ix, ctx),
            NodeKind::Repeat(p) => {
                let repetitions = p.repetitions;
                self.update_repeat(ix, repetitions, ctx)
            }
            NodeKind::RepeatForever(_) => self.update_repeat_forever(ix, ctx),
            NodeKind::RepeatUntilFail(_) => self.update_repeat_until_fail(ix, ctx),
            NodeKind::RepeatForTime(_) => self.update_repeat_for_time(ix, ctx),
            NodeKind::Conditional(_) | NodeKind::ConditionalConstant(_) => self.update_gated(ix, ctx),
            NodeKind::DistanceCheck(c) => {
                let gate = c.gate(ctx)?;
                self.update_distance_check(ix, gate, ctx)
            }
            NodeKind::ImpulseReceiver(_) => self.update_mirror(ix, ctx),
            _ => leaf::update(&mut self.nodes[ix.index()], ctx),
        }
    }

    /// Interrupt `ix`: leaf side effects, then `Fail`, then the same for
    /// every running child.
    pub(crate) fn exit(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) {
        let node = &self.nodes[ix.index()];
        if node.status.is_running() && node.kind.category() == Category::Leaf {
            leaf::exit(node, ctx);
        }
        self.node_mut(ix).status = NodeStatus::Fail;
        self.exit_running_children(ix, ctx);
    }

    pub(crate) fn exit_running_children(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) {
        for k in 0..self.child_count(ix) {
            let child = self.child_at(ix, k);
            if self.node(child).status.is_running() {
                self.exit(child, ctx);
            }
        }
    }

    /// Resume `ix` as though it had just started the child at `child_pos`.
    /// The child itself is left to the caller.
    pub(crate) fn enter_at_index(
        &mut self,
        ix:        NodeIdx,
        child_pos: usize,
        ctx:       &mut TickContext<'_>,
    ) -> BehaviorResult<()> {
        self.node_mut(ix).scratch = Scratch::default();
        match &self.node(ix).kind {
            NodeKind::Sequencer(_)
            | NodeKind::Selector(_)
            | NodeKind::PrioritySelect(_)
            | NodeKind::RandomSelector(_) => self.begin(ix, child_pos),
            NodeKind::Parallel(_) => {
                self.begin(ix, 0);
                for k in (0..self.child_count(ix)).filter(|&k| k != child_pos) {
                    let sibling = self.child_at(ix, k);
                    self.set_status(sibling, NodeStatus::Entering, ctx)?;
                }
            }
            NodeKind::RepeatForTime(p) => {
                let timer = ctx.rng.jitter(p.repeat_time, p.time_random);
                self.begin(ix, 0);
                self.node_mut(ix).scratch.timer = timer;
            }
            _ => self.begin(ix, 0),
        }
        Ok(())
    }
}
