use hz_core::AgentRng;

use crate::{AgentActions, Blackboard};

/// Everything a tree needs from its owner for one tick.
///
/// Built by the host right before `BehaviorTree::update` (or signal
/// delivery) and dropped right after; nothing in here outlives the tick.
pub struct TickContext<'a> {
    /// Seconds since the previous behavior tick.
    pub dt:         f32,
    pub blackboard: &'a mut Blackboard,
    pub actions:    &'a mut dyn AgentActions,
    pub rng:        &'a mut AgentRng,
}

impl<'a> TickContext<'a> {
    pub fn new(
        dt:         f32,
        blackboard: &'a mut Blackboard,
        actions:    &'a mut dyn AgentActions,
        rng:        &'a mut AgentRng,
    ) -> Self {
        Self { dt, blackboard, actions, rng }
    }
}
