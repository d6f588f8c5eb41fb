//! Arena backed document tree
//!
//!     Nodes live in a single vector and are addressed by [NodeId]. Children lists own their
//!     entries, parents are plain indices. Removing a node detaches it from its parent and
//!     tombstones the whole subtree; slots are never reused, so an id held across a mutation
//!     either still names the same node or reports as detached.

use super::node::{Node, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            nodes: vec![Node::new(NodeKind::Root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn content(&self, id: NodeId) -> &str {
        &self.nodes[id.0].content
    }

    /// False once the node (or one of its ancestors) was removed.
    pub fn is_attached(&self, id: NodeId) -> bool {
        !self.nodes[id.0].removed
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Append a fresh node as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Insert a fresh node right after `id` among its siblings.
    ///
    /// The root has no siblings; a sibling requested for it is appended to the root instead.
    pub fn add_sibling(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let Some(parent) = self.parent(id) else {
            return self.push_child(id, kind);
        };
        let new_id = self.alloc(kind);
        self.nodes[new_id.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|&c| c == id)
            .map(|p| p + 1)
            .unwrap_or(siblings.len());
        siblings.insert(pos, new_id);
        new_id
    }

    /// Detach `id` from its parent and drop the subtree below it.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.removed = true;
            stack.extend(std::mem::take(&mut node.children));
        }
    }

    /// Drop every direct child of `id` with the given kind.
    pub fn remove_children_of_kind(&mut self, id: NodeId, kind: NodeKind) {
        let doomed: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&c| self.kind(c) == kind)
            .collect();
        for child in doomed {
            self.remove(child);
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Next sibling that carries meaning, skipping separators.
    pub fn next_semantic_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id)?;
        while self.kind(current) == NodeKind::Sep {
            current = self.next_sibling(current)?;
        }
        Some(current)
    }

    /// First direct child with the given kind.
    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == kind)
    }

    /// First `body` or `func_body` child.
    pub fn first_body(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c).is_body())
    }

    pub fn write_tree(&self) -> String {
        let mut res = String::new();
        self.write_tree_with_level(self.root, 0, &mut res);
        res
    }

    fn write_tree_with_level(&self, id: NodeId, level: usize, res: &mut String) {
        res.push_str(&" ".repeat(2 * level));
        res.push_str(&self.node(id).write());
        res.push('\n');
        for &child in self.children(id) {
            self.write_tree_with_level(child, level + 1, res);
        }
    }
}
