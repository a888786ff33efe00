//! The node arena and the per-agent tree instance.

use std::fmt::Write as _;

use hz_core::NodeId;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{leaf, BehaviorResult, Node, NodeIdx, NodeKind, NodeStatus, Signal, TickContext};

/// A behavior tree: nodes in a flat arena, root at index 0.
///
/// Built once per asset by [`TreeBuilder`](crate::TreeBuilder) and handed to
/// each agent through [`deep_copy`](Self::deep_copy).  Runtime state (status,
/// timers, active child) lives in the nodes, so two copies never interfere.
#[derive(Clone, Debug)]
pub struct BehaviorTree {
    pub(crate) name:          String,
    pub(crate) nodes:         Vec<Node>,
    /// Root-to-target node paths, keyed by target id, for every node an
    /// impulse receiver can jump to.
    pub(crate) impulse_paths: FxHashMap<NodeId, Vec<NodeIdx>>,
    pub(crate) started:       bool,
}

pub(crate) const ROOT: NodeIdx = NodeIdx(0);

impl BehaviorTree {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeIdx {
        ROOT
    }

    #[inline]
    pub fn node(&self, ix: NodeIdx) -> &Node {
        &self.nodes[ix.index()]
    }

    pub fn status(&self) -> NodeStatus {
        self.node(ROOT).status
    }

    /// Preorder walk from the root.
    pub fn preorder(&self) -> Vec<NodeIdx> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(ix) = stack.pop() {
            out.push(ix);
            stack.extend(self.node(ix).children.iter().rev().copied());
        }
        out
    }

    /// First node in preorder carrying `id`.
    pub fn find_by_id(&self, id: NodeId) -> Option<NodeIdx> {
        if !id.is_valid() {
            return None;
        }
        self.preorder().into_iter().find(|&ix| self.node(ix).id == id)
    }

    /// First node in preorder named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<NodeIdx> {
        self.preorder().into_iter().find(|&ix| self.node(ix).name == name)
    }

    pub fn impulse_path(&self, target: NodeId) -> Option<&[NodeIdx]> {
        self.impulse_paths.get(&target).map(Vec::as_slice)
    }

    // ── Copying ───────────────────────────────────────────────────────────────

    /// Structurally identical tree with fresh runtime state.
    ///
    /// Walks the original with a pair of stacks (original node, its copy)
    /// rather than recursion, so arbitrarily deep trees copy safely.  Impulse
    /// paths are rebuilt against the new arena.
    pub fn deep_copy(&self) -> BehaviorTree {
        let mut nodes: Vec<Node> = Vec::with_capacity(self.nodes.len());
        let mut remap = vec![NodeIdx(u32::MAX); self.nodes.len()];

        nodes.push(self.node(ROOT).fresh_copy(None));
        remap[ROOT.index()] = ROOT;

        let mut originals = vec![ROOT];
        let mut copies = vec![ROOT];
        while let (Some(original), Some(copy)) = (originals.pop(), copies.pop()) {
            for &child in &self.node(original).children {
                let fresh = NodeIdx(nodes.len() as u32);
                nodes.push(self.node(child).fresh_copy(Some(copy)));
                nodes[copy.index()].children.push(fresh);
                remap[child.index()] = fresh;
                originals.push(child);
                copies.push(fresh);
            }
        }

        let impulse_paths = self
            .impulse_paths
            .iter()
            .map(|(&target, path)| (target, path.iter().map(|ix| remap[ix.index()]).collect()))
            .collect();

        BehaviorTree {
            name: self.name.clone(),
            nodes,
            impulse_paths,
            started: false,
        }
    }

    // ── Running ───────────────────────────────────────────────────────────────

    /// Enter the root.  Called implicitly by the first [`update`](Self::update).
    pub fn start(&mut self, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        self.started = true;
        debug!(tree = %self.name, "starting behavior tree");
        self.set_status(ROOT, NodeStatus::Entering, ctx)
    }

    /// One behavior tick.  When the root finishes it is re-entered at once,
    /// so a tree never stops on its own.
    pub fn update(&mut self, ctx: &mut TickContext<'_>) -> BehaviorResult<NodeStatus> {
        if !self.started {
            self.start(ctx)?;
        }
        let status = self.tick(ROOT, ctx)?;
        if status.is_terminal() {
            trace!(tree = %self.name, %status, "root finished; restarting");
            self.set_status(ROOT, NodeStatus::Entering, ctx)?;
        }
        Ok(status)
    }

    /// Interrupt everything that is running.
    pub fn exit_all(&mut self, ctx: &mut TickContext<'_>) {
        self.exit(ROOT, ctx);
        self.started = false;
    }

    /// Deliver an external signal.  Returns whether anything reacted.
    ///
    /// Completion signals finish the running leaves they concern; their
    /// parents see the new status on the next tick.  An impulse jumps to the
    /// target of the first receiver (in preorder) that hears it.
    pub fn handle_signal(&mut self, signal: &Signal, ctx: &mut TickContext<'_>) -> BehaviorResult<bool> {
        let Signal::Impulse { name, source } = signal else {
            let mut reacted = false;
            for node in &mut self.nodes {
                reacted |= leaf::on_signal(node, signal);
            }
            return Ok(reacted);
        };

        let receiver = self.preorder().into_iter().find_map(|ix| match &self.node(ix).kind {
            NodeKind::ImpulseReceiver(r) if r.hears(name, source.as_deref()) => Some(r.target_node_id),
            _ => None,
        });
        let Some(target) = receiver.and_then(|raw| NodeId::from_signed(raw as i64)) else {
            return Ok(false);
        };
        debug!(tree = %self.name, impulse = %name, target = target.to_signed(), "impulse received");
        self.jump_to(target, ctx)?;
        Ok(true)
    }

    /// Abandon whatever is running and resume at node `target`, as though
    /// every ancestor had just chosen the branch leading to it.
    pub fn jump_to(&mut self, target: NodeId, ctx: &mut TickContext<'_>) -> BehaviorResult<bool> {
        let Some(path) = self.impulse_paths.get(&target).cloned() else {
            return Ok(false);
        };
        self.exit(ROOT, ctx);
        self.started = true;
        for pair in path.windows(2) {
            let (ancestor, next) = (pair[0], pair[1]);
            let pos = self
                .node(ancestor)
                .children
                .iter()
                .position(|&c| c == next)
                .unwrap_or_default();
            self.enter_at_index(ancestor, pos, ctx)?;
        }
        if let Some(&last) = path.last() {
            self.set_status(last, NodeStatus::Entering, ctx)?;
        }
        Ok(true)
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    /// Indented one-line-per-node dump: `Name [Type] Status`.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((ix, depth)) = stack.pop() {
            let node = self.node(ix);
            let _ = writeln!(
                out,
                "{:indent$}{} [{}] {}",
                "",
                node.name,
                node.type_name(),
                node.status,
                indent = depth * 2
            );
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        out
    }
}
