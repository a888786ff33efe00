use hz_core::{NodeId, Vec3};

use crate::{NodeKind, NodeStatus};

/// Position of a node in its tree's arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Transient per-node state.  Never serialized, reset on copy.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Scratch {
    /// Active child for index-driven composites.
    pub index: usize,
    /// Countdown in seconds.
    pub timer: f32,
    /// Completed repetitions, or ticks until the next retarget.
    pub count: i32,
    pub point: Vec3,
    pub dir:   Vec3,
}

/// One node of a behavior tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Authoring id, unique within a tree; `NodeId::INVALID` if unassigned.
    pub id:   NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub(crate) status:   NodeStatus,
    pub(crate) children: Vec<NodeIdx>,
    pub(crate) parent:   Option<NodeIdx>,
    pub(crate) scratch:  Scratch,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id:       NodeId::INVALID,
            name:     name.into(),
            kind:     kind.into(),
            status:   NodeStatus::Entering,
            children: Vec::new(),
            parent:   None,
            scratch:  Scratch::default(),
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = NodeId(id);
        self
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Same persistent data, fresh runtime state, no links.
    pub(crate) fn fresh_copy(&self, parent: Option<NodeIdx>) -> Node {
        Node {
            id:       self.id,
            name:     self.name.clone(),
            kind:     self.kind.clone(),
            status:   NodeStatus::Entering,
            children: Vec::with_capacity(self.children.len()),
            parent,
            scratch:  Scratch::default(),
        }
    }
}
