//! Composites: nodes that choose among several children.
//!
//! | Type             | Policy                                                  |
//! |------------------|---------------------------------------------------------|
//! | `Sequencer`      | children in order; any `Fail` fails the sequence        |
//! | `Selector`       | children in order; first `Success` wins                 |
//! | `Parallel`       | all children at once; first finisher or wait for all    |
//! | `PrioritySelect` | the child with the highest utility at entry             |
//! | `RandomSelector` | one of two children, weighted                           |

use hz_core::AgentRng;

use crate::field::{field_enum, node_params};
use crate::{BehaviorResult, BehaviorTree, NodeIdx, NodeStatus, TickContext};

field_enum! {
    /// When a `Parallel` finishes.
    pub enum FinishMethod {
        /// Adopt the first terminal status of any child and cancel the rest.
        #[default]
        FirstChildToFinish,
        /// Succeed once every child succeeded; any `Fail` fails at once.
        WaitForAllChildren,
    }
}

node_params! {
    pub struct Sequencer {}
}

node_params! {
    pub struct Selector {}
}

node_params! {
    pub struct Parallel {
        finish_method: FinishMethod = "FinishMethod" => FinishMethod::FirstChildToFinish,
    }
}

node_params! {
    pub struct PrioritySelect {}
}

node_params! {
    pub struct RandomSelector {
        left_weight:  f32 = "LeftWeight"  => 0.5,
        right_weight: f32 = "RightWeight" => 0.5,
    }
}

/// Child index a `RandomSelector` runs: 0 with probability
/// `left / (left + right)`, else 1.
pub(crate) fn weighted_pick(left: f32, right: f32, rng: &mut AgentRng) -> usize {
    let picked = rng.range_f32(0.0, left + right);
    if picked < left { 0 } else { 1 }
}

impl BehaviorTree {
    // ── Entry ─────────────────────────────────────────────────────────────────

    pub(crate) fn enter_sequencer(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
        self.begin(ix, 0);
        let first = self.child_at(ix, 0);
        self.enter(first, ctx)
    }

    /// Entry for the single-active-child composites: start `pick`.
    pub(crate) fn enter_picked(
        &mut self,
        ix:   NodeIdx,
        pick: usize,
        ctx:  &mut TickContext<'_>,
    ) -> BehaviorResult<()> {
        self.begin(ix, pick);
        let child = self.child_at(ix, pick);
        self.set_status(child, NodeStatus::Entering, ctx)?;
        Ok(())
    }

    pub(crate) fn enter_parallel(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
        self.begin(ix, 0);
        for k in 0..self.child_count(ix) {
            let child = self.child_at(ix, k);
            self.set_status(child, NodeStatus::Entering, ctx)?;
        }
        Ok(())
    }

    /// Index of the child with the highest utility.  Utilities must beat
    /// zero to count; ties keep the earlier child.
    pub(crate) fn highest_utility_child(&self, ix: NodeIdx) -> usize {
        let mut best = 0;
        let mut best_utility = 0.0;
        for (k, &child) in self.node(ix).children.iter().enumerate() {
            let utility = self.node(child).kind.utility();
            if utility > best_utility {
                best = k;
                best_utility = utility;
            }
        }
        best
    }

    // ── Update ────────────────────────────────────────────────────────────────

    pub(crate) fn update_sequencer(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let current = self.node(ix).scratch.index;
        let child = self.child_at(ix, current);
        match self.tick(child, ctx)? {
            NodeStatus::Success => {
                let next = current + 1;
                self.node_mut(ix).scratch.index = next;
                if next == self.child_count(ix) {
                    return Ok(self.finish(ix, NodeStatus::Success));
                }
                let next_child = self.child_at(ix, next);
                self.enter(next_child, ctx)?;
            }
            NodeStatus::Fail => return Ok(self.finish(ix, NodeStatus::Fail)),
            _ => {}
        }
        Ok(self.node(ix).status)
    }

    pub(crate) fn update_selector(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let current = self.node(ix).scratch.index;
        let child = self.child_at(ix, current);
        match self.tick(child, ctx)? {
            NodeStatus::Fail => {
                let next = current + 1;
                self.node_mut(ix).scratch.index = next;
                if next == self.child_count(ix) {
                    return Ok(self.finish(ix, NodeStatus::Fail));
                }
                let next_child = self.child_at(ix, next);
                self.set_status(next_child, NodeStatus::Entering, ctx)?;
            }
            NodeStatus::Success => return Ok(self.finish(ix, NodeStatus::Success)),
            _ => {}
        }
        Ok(self.node(ix).status)
    }

    pub(crate) fn update_parallel(
        &mut self,
        ix:     NodeIdx,
        method: FinishMethod,
        ctx:    &mut TickContext<'_>,
    ) -> BehaviorResult<NodeStatus> {
        let mut complete = true;
        for k in 0..self.child_count(ix) {
            let child = self.child_at(ix, k);
            let status = match self.node(child).status {
                s if s.is_terminal() => s,
                _ => self.tick(child, ctx)?,
            };
            match status {
                NodeStatus::Fail => {
                    self.exit_running_children(ix, ctx);
                    return Ok(self.finish(ix, NodeStatus::Fail));
                }
                NodeStatus::Success if method == FinishMethod::FirstChildToFinish => {
                    self.exit_running_children(ix, ctx);
                    return Ok(self.finish(ix, NodeStatus::Success));
                }
                NodeStatus::Success => {}
                NodeStatus::Running | NodeStatus::Entering => complete = false,
            }
        }
        if complete {
            return Ok(self.finish(ix, NodeStatus::Success));
        }
        Ok(self.node(ix).status)
    }

    /// Update for the single-active-child composites: mirror the child.
    pub(crate) fn update_picked(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, self.node(ix).scratch.index);
        let status = self.tick(child, ctx)?;
        Ok(self.finish(ix, status))
    }
}
