//! # Document tree
//!
//! The rich document is a plain tagged-union tree with arena-indexed nodes:
//! [`Document`] owns a `Vec<Node>` and nodes refer to parent and children by
//! [`NodeId`] (an index into the arena), never by pointer. Detached nodes stay
//! in the arena as tombstones; reachability from the root defines liveness,
//! which is what lets late resolution patches become no-ops when the content
//! they targeted is gone.
//!
//! Equality is structural: two documents are equal when their root subtrees
//! match node-for-node, regardless of arena slot order.

pub mod marks;
pub mod node;

pub use marks::{LinkMark, MarkKind, MarkSet};
pub use node::{HashtagKind, NodeKind, QuoteAttribution};

use serde::Serialize;

/// Index of a node in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// One node in the arena: payload, marks (meaningful for inline nodes only),
/// and parent/child links by index.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub marks: MarkSet,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The rich document: root entity owning an ordered sequence of top-level
/// blocks. Rebuilt from scratch on full reparse; mutated in place by the
/// editing command layer.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Root,
            marks: MarkSet::plain(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a detached node and return its id.
    pub fn push_node(&mut self, kind: NodeKind, marks: MarkSet) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            marks,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn marks(&self, id: NodeId) -> &MarkSet {
        &self.node(id).marks
    }

    pub fn marks_mut(&mut self, id: NodeId) -> &mut MarkSet {
        &mut self.node_mut(id).marks
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.node(parent).children.len();
        self.insert_child(parent, len, child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none(), "child already attached");
        let index = index.min(self.node(parent).children.len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Unlink a node from its parent. The node stays in the arena but is no
    /// longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Whether a node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Preorder traversal of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for &c in self.node(n).children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// The character length of an inline node for selection offsets: text
    /// runs count their chars, every other inline node is a single atom.
    pub fn inline_len(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text { text } => text.chars().count(),
            _ => 1,
        }
    }

    /// Total selection length of a block's inline flow.
    pub fn inline_flow_len(&self, block: NodeId) -> usize {
        self.children(block)
            .iter()
            .map(|&c| self.inline_len(c))
            .sum()
    }

    /// Concatenated text of a block's inline flow, with atoms rendered as a
    /// single placeholder char. Debug/test helper.
    pub fn inline_text(&self, block: NodeId) -> String {
        let mut out = String::new();
        for &c in self.children(block) {
            match &self.node(c).kind {
                NodeKind::Text { text } => out.push_str(text),
                _ => out.push('\u{fffc}'),
            }
        }
        out
    }

    fn subtree_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let na = self.node(a);
        let nb = other.node(b);
        if na.kind != nb.kind || na.marks != nb.marks {
            return false;
        }
        if na.children.len() != nb.children.len() {
            return false;
        }
        na.children
            .iter()
            .zip(nb.children.iter())
            .all(|(&ca, &cb)| self.subtree_eq(ca, other, cb))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}
