//! Slot arena holding the nodes of one compile.
//!
//! # Panics
//!
//! Looking up or taking a slot through a [`NodeId`] whose node was
//! already released panics. `NodeId` is neither `Copy` nor `Clone` and
//! every release consumes it, so safe code only reaches this through a
//! bug in the arena itself, the same way an out-of-range slice index
//! would.

use super::node::{AssignTarget, Node, ValueKind};
use super::NodeId;
use tracing::trace;

struct Slot {
    node: Node,
    depth: usize,
    kind: ValueKind,
}

/// Owner of every node of one compile session.
///
/// Slots are recycled through a free list. A [`NodeId`] is handed out once
/// per allocation and is consumed by whichever operation releases it, so a
/// node can be attached to at most one parent and freed at most once.
#[derive(Default)]
pub struct NodeArena {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    live: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, node: Node) -> NodeId {
        let depth = 1 + node
            .children()
            .iter()
            .map(|child| self.depth(child))
            .max()
            .unwrap_or(0);
        let kind = self.infer_kind(&node);
        let slot = Slot { node, depth, kind };

        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(slot);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(slot));
                NodeId((self.slots.len() - 1) as u32)
            }
        }
    }

    fn infer_kind(&self, node: &Node) -> ValueKind {
        match node {
            Node::StringLiteral(_)
            | Node::StringVar(_)
            | Node::StringRange { .. }
            | Node::StringConcat { .. } => ValueKind::String,
            Node::Vector { .. }
            | Node::UnaryVector { .. }
            | Node::VectorBinary { .. }
            | Node::VectorDefinition { .. } => ValueKind::Vector,
            Node::Conditional { consequent, .. } => self.kind(consequent),
            Node::ReturnEnvelope { body, .. } => self.kind(body),
            Node::Sequence(items) => items
                .last()
                .map(|last| self.kind(last))
                .unwrap_or(ValueKind::Scalar),
            Node::Assign { target, .. } => AssignTarget::kind(target),
            _ => ValueKind::Scalar,
        }
    }

    fn slot(&self, id: &NodeId) -> &Slot {
        self.slots[id.index()]
            .as_ref()
            .expect("node id refers to a released slot")
    }

    pub fn get(&self, id: &NodeId) -> &Node {
        &self.slot(id).node
    }

    pub fn get_mut(&mut self, id: &NodeId) -> &mut Node {
        &mut self.slots[id.index()]
            .as_mut()
            .expect("node id refers to a released slot")
            .node
    }

    /// Height of the subtree rooted at `id`; a leaf has depth 1.
    pub fn depth(&self, id: &NodeId) -> usize {
        self.slot(id).depth
    }

    pub fn kind(&self, id: &NodeId) -> ValueKind {
        self.slot(id).kind
    }

    pub fn literal(&self, id: &NodeId) -> Option<f64> {
        self.get(id).literal()
    }

    /// Number of elements a vector-valued node produces.
    pub fn vector_size(&self, id: &NodeId) -> usize {
        match self.get(id) {
            Node::Vector { len, .. } => *len,
            Node::UnaryVector { temp, .. } | Node::VectorBinary { temp, .. } => temp.len(),
            Node::VectorDefinition { storage, .. } => storage.len(),
            Node::Assign {
                target: AssignTarget::Vector { len, .. },
                ..
            } => *len,
            Node::Conditional { consequent, .. } => self.vector_size(consequent),
            Node::ReturnEnvelope { body, .. } => self.vector_size(body),
            Node::Sequence(items) => items.last().map(|l| self.vector_size(l)).unwrap_or(0),
            _ => 0,
        }
    }

    /// Release a single node and return it; its children stay allocated
    /// and are now owned by the returned value.
    pub fn take(&mut self, id: NodeId) -> Node {
        let slot = self.slots[id.index()]
            .take()
            .expect("node id refers to a released slot");
        self.free.push(id.0);
        self.live -= 1;
        slot.node
    }

    /// Release a node and every node beneath it.
    pub fn free_tree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        let mut released = 0usize;
        while let Some(id) = pending.pop() {
            let node = self.take(id);
            pending.extend(node.into_children());
            released += 1;
        }
        trace!(released, "Freed subtree");
    }

    pub fn free_all<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        for id in ids {
            self.free_tree(id);
        }
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Indented outline of the tree under `id`, one node per line.
    pub fn render(&self, id: &NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![(id, 0usize)];
        while let Some((id, indent)) = pending.pop() {
            out.push_str(&"  ".repeat(indent));
            out.push_str(&format!("{:?}\n", self.get(id)));
            let children = self.get(id).children();
            pending.extend(children.into_iter().rev().map(|c| (c, indent + 1)));
        }
        out
    }

    /// Drop every node, invalidating all outstanding ids.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}
