//! Assemble and validate a [`BehaviorTree`].

use rustc_hash::{FxHashMap, FxHashSet};

use hz_core::NodeId;

use crate::tree::ROOT;
use crate::{BehaviorError, BehaviorResult, BehaviorTree, Node, NodeIdx, NodeKind};

/// Incremental tree assembly.  Nodes are added parent-first; [`build`]
/// checks child counts and id uniqueness, and resolves every impulse
/// receiver's target.
///
/// [`build`]: TreeBuilder::build
pub struct TreeBuilder {
    name:  String,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        Self { name: name.into(), nodes: vec![root] }
    }

    pub fn root(&self) -> NodeIdx {
        ROOT
    }

    /// Append `node` as the last child of `parent`.
    pub fn child(&mut self, parent: NodeIdx, mut node: Node) -> NodeIdx {
        let ix = NodeIdx(self.nodes.len() as u32);
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(ix);
        ix
    }

    pub fn build(self) -> BehaviorResult<BehaviorTree> {
        for node in &self.nodes {
            check_arity(node)?;
        }
        self.check_unique_ids()?;

        let mut impulse_paths = FxHashMap::default();
        for node in &self.nodes {
            let NodeKind::ImpulseReceiver(r) = &node.kind else { continue };
            let missing = || BehaviorError::ImpulseTargetMissing {
                receiver: node.name.clone(),
                target:   r.target_node_id as i64,
            };
            let target_id = NodeId::from_signed(r.target_node_id as i64)
                .filter(|id| id.is_valid())
                .ok_or_else(missing)?;
            let target = self
                .nodes
                .iter()
                .position(|n| n.id == target_id)
                .ok_or_else(missing)?;
            impulse_paths.insert(target_id, self.path_to(NodeIdx(target as u32)));
        }

        Ok(BehaviorTree {
            name: self.name,
            nodes: self.nodes,
            impulse_paths,
            started: false,
        })
    }

    /// Assigned ids must be unique; any number of nodes may be unassigned.
    fn check_unique_ids(&self) -> BehaviorResult<()> {
        let mut seen = FxHashSet::default();
        for node in self.nodes.iter().filter(|n| n.id.is_valid()) {
            if !seen.insert(node.id) {
                let first = self
                    .nodes
                    .iter()
                    .find(|n| n.id == node.id)
                    .map_or_else(String::new, |n| n.name.clone());
                return Err(BehaviorError::DuplicateNodeId {
                    id: node.id.to_signed(),
                    first,
                    second: node.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Root-first chain of nodes ending at `ix`.
    fn path_to(&self, ix: NodeIdx) -> Vec<NodeIdx> {
        let mut path = vec![ix];
        let mut at = ix;
        while let Some(parent) = self.nodes[at.index()].parent {
            path.push(parent);
            at = parent;
        }
        path.reverse();
        path
    }
}

fn check_arity(node: &Node) -> BehaviorResult<()> {
    let got = node.children.len();
    let (min, max) = node.kind.arity();
    if got >= min && max.is_none_or(|max| got <= max) {
        return Ok(());
    }
    let expected = match (min, max) {
        (0, Some(0))            => "no",
        (1, Some(1))            => "exactly one",
        (2, Some(2))            => "exactly two",
        (_, None)               => "at least one",
        _                       => "a different number of",
    };
    Err(BehaviorError::Arity {
        node: node.name.clone(),
        node_type: node.type_name(),
        expected,
        got,
    })
}
