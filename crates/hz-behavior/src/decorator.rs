//! Decorators: nodes that wrap exactly one child and reshape its result.

use hz_core::math::{dist_sqr, horizontal_dist_sqr};

use crate::field::{field_enum, node_params};
use crate::{BbValue, BehaviorError, BehaviorResult, BehaviorTree, Blackboard, NodeIdx, NodeStatus, TickContext};

/// Height difference past which a `DistanceCheck` target counts as
/// unreachable.
pub const HEIGHT_DIFFERENCE_LIMIT: f32 = 5.0;

field_enum! {
    /// Comparison used by `Conditional` and `ConditionalConstant`.
    pub enum ConditionalType {
        #[default]
        Equal,
        NotEqual,
        LessThan,
        MoreThan,
        LessOrEqual,
        MoreOrEqual,
    }
}

impl ConditionalType {
    pub fn holds<T: PartialOrd>(self, a: T, b: T) -> bool {
        match self {
            ConditionalType::Equal       => a == b,
            ConditionalType::NotEqual    => a != b,
            ConditionalType::LessThan    => a < b,
            ConditionalType::MoreThan    => a > b,
            ConditionalType::LessOrEqual => a <= b,
            ConditionalType::MoreOrEqual => a >= b,
        }
    }
}

field_enum! {
    pub enum DistanceCheckType {
        #[default]
        SucceedWhenCloserThanDistance,
        SucceedWhenFartherThanDistance,
    }
}

node_params! {
    pub struct AlwaysSucceed {
        /// When false, succeed on the first update even if the child is
        /// still running (the child is cancelled).
        only_succeed_on_finish: bool = "OnlySucceedOnFinish" => true,
    }
}

node_params! {
    pub struct InvertFinish {}
}

node_params! {
    pub struct Repeat {
        repetitions: i32 = "Repetitions" => 3,
    }
}

node_params! {
    pub struct RepeatForever {}
}

node_params! {
    pub struct RepeatUntilFail {}
}

node_params! {
    pub struct RepeatForTime {
        repeat_time: f32 = "RepeatTime" => 3.0,
        time_random: f32 = "TimeRandom" => 1.0,
    }
}

node_params! {
    pub struct Conditional {
        bb_key1:          String          = "BBKey1"          => String::new(),
        bb_key2:          String          = "BBKey2"          => String::new(),
        conditional_type: ConditionalType = "ConditionalType" => ConditionalType::Equal,
    }
}

node_params! {
    /// `Conditional` against a literal.  Int entries compare against the
    /// literal truncated to an integer.
    pub struct ConditionalConstant {
        bb_key1:          String          = "BBKey1"          => String::new(),
        conditional_type: ConditionalType = "ConditionalType" => ConditionalType::Equal,
        comparison_value: f32             = "ComparisonValue" => 0.0,
    }
}

node_params! {
    pub struct DistanceCheck {
        target_blackboard_entry:                  String            = "TargetBlackboardEntry"               => String::new(),
        distance:                                 f32               = "Distance"                            => 5.0,
        check_type:                               DistanceCheckType = "CheckType"                           => DistanceCheckType::SucceedWhenCloserThanDistance,
        check_3d:                                 bool              = "Check3D"                             => false,
        invalidate_if_too_much_height_difference: bool              = "InvalidateIfTooMuchHeightDifference" => false,
        fail_on_height_difference:                bool              = "FailOnHeightDifference"              => false,
    }
}

node_params! {
    pub struct ImpulseReceiver {
        /// Authoring id of the node to jump to.
        target_node_id:       i32    = "TargetNodeID"       => 0,
        /// Named object whose events this receiver hears; empty for the owner.
        object_name:          String = "ObjectName"         => String::new(),
        impulse_to_respond_to: String = "ImpulseToRespondTo" => String::new(),
    }
}

impl Conditional {
    pub fn check(&self, node: &str, blackboard: &Blackboard) -> BehaviorResult<bool> {
        let left = blackboard.get(&self.bb_key1)?;
        let right = blackboard.get(&self.bb_key2)?;
        match (left, right) {
            (BbValue::Float(a), BbValue::Float(b)) => Ok(self.conditional_type.holds(*a, *b)),
            (BbValue::Int(a), BbValue::Int(b))     => Ok(self.conditional_type.holds(*a, *b)),
            _ => Err(BehaviorError::InvalidComparison {
                node:  node.to_owned(),
                left:  left.kind_name(),
                right: right.kind_name(),
            }),
        }
    }
}

impl ConditionalConstant {
    pub fn check(&self, node: &str, blackboard: &Blackboard) -> BehaviorResult<bool> {
        match blackboard.get(&self.bb_key1)? {
            BbValue::Float(a) => Ok(self.conditional_type.holds(*a, self.comparison_value)),
            BbValue::Int(a)   => Ok(self.conditional_type.holds(*a, self.comparison_value as i32)),
            other => Err(BehaviorError::InvalidComparison {
                node:  node.to_owned(),
                left:  other.kind_name(),
                right: "a constant",
            }),
        }
    }
}

impl ImpulseReceiver {
    /// Whether this receiver answers `name` raised on `source`.
    pub fn hears(&self, name: &str, source: Option<&str>) -> bool {
        if self.impulse_to_respond_to != name {
            return false;
        }
        match source {
            None      => self.object_name.is_empty(),
            Some(src) => self.object_name == src,
        }
    }
}

/// What a `DistanceCheck` does with its child this tick.
pub(crate) enum Gate {
    Pass,
    Block,
}

impl DistanceCheck {
    pub(crate) fn gate(&self, ctx: &TickContext<'_>) -> BehaviorResult<Gate> {
        let Some(target) = ctx.blackboard.point(&self.target_blackboard_entry, ctx.actions.entities())? else {
            return Ok(Gate::Block);
        };
        let position = ctx.actions.steering().body.position;

        if self.invalidate_if_too_much_height_difference
            && (target.y - position.y).abs() > HEIGHT_DIFFERENCE_LIMIT
        {
            return Ok(if self.fail_on_height_difference { Gate::Block } else { Gate::Pass });
        }

        let d2 = if self.check_3d {
            dist_sqr(position, target)
        } else {
            horizontal_dist_sqr(position, target)
        };
        let beyond = d2 > self.distance * self.distance;
        let blocked = match self.check_type {
            DistanceCheckType::SucceedWhenCloserThanDistance  => beyond,
            DistanceCheckType::SucceedWhenFartherThanDistance => !beyond,
        };
        Ok(if blocked { Gate::Block } else { Gate::Pass })
    }
}

impl BehaviorTree {
    /// Update for decorators that simply mirror their child.
    pub(crate) fn update_mirror(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, 0);
        let status = self.tick(child, ctx)?;
        Ok(self.finish(ix, status))
    }

    pub(crate) fn update_always_succeed(
        &mut self,
        ix:             NodeIdx,
        only_on_finish: bool,
        ctx:            &mut TickContext<'_>,
    ) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, 0);
        let status = self.tick(child, ctx)?;
        if !only_on_finish {
            self.exit_running_children(ix, ctx);
            return Ok(self.finish(ix, NodeStatus::Success));
        }
        if status.is_terminal() {
            return Ok(self.finish(ix, NodeStatus::Success));
        }
        Ok(self.node(ix).status)
    }

    pub(crate) fn update_invert(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, 0);
        match self.tick(child, ctx)? {
            NodeStatus::Fail    => Ok(self.finish(ix, NodeStatus::Success)),
            NodeStatus::Success => Ok(self.finish(ix, NodeStatus::Fail)),
            _ => Ok(self.node(ix).status),
        }
    }

    pub(crate) fn update_repeat(
        &mut self,
        ix:          NodeIdx,
        repetitions: i32,
        ctx:         &mut TickContext<'_>,
    ) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, 0);
        match self.tick(child, ctx)? {
            NodeStatus::Success => {
                let done = self.node(ix).scratch.count + 1;
                self.node_mut(ix).scratch.count = done;
                if done >= repetitions {
                    return Ok(self.finish(ix, NodeStatus::Success));
                }
                self.enter(child, ctx)?;
            }
            NodeStatus::Fail => return Ok(self.finish(ix, NodeStatus::Fail)),
            _ => {}
        }
        Ok(self.node(ix).status)
    }

    pub(crate) fn update_repeat_forever(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, 0);
        if self.tick(child, ctx)?.is_terminal() {
            self.set_status(child, NodeStatus::Entering, ctx)?;
        }
        Ok(self.finish(ix, NodeStatus::Running))
    }

    pub(crate) fn update_repeat_until_fail(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let child = self.child_at(ix, 0);
        match self.tick(child, ctx)? {
            NodeStatus::Success => {
                self.set_status(child, NodeStatus::Entering, ctx)?;
            }
            NodeStatus::Fail => return Ok(self.finish(ix, NodeStatus::Fail)),
            _ => {}
        }
        Ok(self.node(ix).status)
    }

    pub(crate) fn update_repeat_for_time(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let timer = self.node(ix).scratch.timer - ctx.dt;
        self.node_mut(ix).scratch.timer = timer;
        if timer <= 0.0 {
            self.exit_running_children(ix, ctx);
            return Ok(self.finish(ix, NodeStatus::Success));
        }
        self.update_repeat_until_fail(ix, ctx)
    }

    pub(crate) fn enter_gated(&mut self, ix: NodeIdx, pass: bool, ctx: &mut TickContext<'_>) -> BehaviorResult<()> {
        if !pass {
            self.node_mut(ix).status = NodeStatus::Fail;
            return Ok(());
        }
        self.begin(ix, 0);
        let child = self.child_at(ix, 0);
        self.enter(child, ctx)
    }

    pub(crate) fn update_gated(&mut self, ix: NodeIdx, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        let status = self.node(ix).status;
        if status.is_terminal() {
            return Ok(status);
        }
        self.update_mirror(ix, ctx)
    }

    pub(crate) fn update_distance_check(
        &mut self,
        ix:   NodeIdx,
        gate: Gate,
        ctx:  &mut TickContext<'_>,
    ) -> BehaviorResult<NodeStatus> {
        match gate {
            Gate::Pass  => self.update_mirror(ix, ctx),
            Gate::Block => {
                self.exit_running_children(ix, ctx);
                Ok(self.finish(ix, NodeStatus::Fail))
            }
        }
    }
}
