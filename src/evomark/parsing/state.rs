//! Transient state of one parse call

use crate::evomark::ast::{NodeId, NodeKind, Tree};
use serde_json::{Map, Value};

/// Checkpoint of the scan window, restored after recursing into a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedState {
    pos: usize,
    start: usize,
    end: usize,
    curr_node: NodeId,
}

#[derive(Debug)]
pub struct ParseState {
    /// Namespace -> settings, filled by config-like rules
    pub config: Map<String, Value>,
    pub pos: usize,
    pub start: usize,
    pub end: usize,
    /// Node new children are appended to
    pub curr_node: NodeId,
    pub tree: Tree,
    /// Set once any window, nested or not, hit input no rule could consume
    pub aborted: bool,
}

impl ParseState {
    pub fn new(src: &str) -> Self {
        let tree = Tree::new();
        ParseState {
            config: Map::new(),
            pos: 0,
            start: 0,
            end: src.len(),
            curr_node: tree.root(),
            tree,
            aborted: false,
        }
    }

    pub fn root_node(&self) -> NodeId {
        self.tree.root()
    }

    pub fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.tree.push_child(self.curr_node, kind)
    }

    pub fn push_warning_node(&mut self, message: impl Into<String>) -> NodeId {
        let node = self.push_node(NodeKind::Warning);
        self.tree.node_mut(node).set_content(message);
        node
    }

    /// Warnings about malformed constructs go to the document root, not the local position.
    pub fn push_warning_node_to_root(&mut self, message: impl Into<String>) -> NodeId {
        let root = self.root_node();
        let node = self.tree.push_child(root, NodeKind::Warning);
        self.tree.node_mut(node).set_content(message);
        node
    }

    pub fn set_local_state(
        &mut self,
        pos: usize,
        start: usize,
        end: usize,
        curr_node: NodeId,
    ) -> SavedState {
        let saved = SavedState {
            pos: self.pos,
            start: self.start,
            end: self.end,
            curr_node: self.curr_node,
        };
        self.pos = pos;
        self.start = start;
        self.end = end;
        self.curr_node = curr_node;
        saved
    }

    pub fn restore_state(&mut self, saved: SavedState) {
        self.pos = saved.pos;
        self.start = saved.start;
        self.end = saved.end;
        self.curr_node = saved.curr_node;
    }

    /// The whole active window `[start, end)`.
    pub fn slice_range<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }

    /// What is left of the active window, `[pos, end)`.
    pub fn slice_remaining<'a>(&self, src: &'a str) -> &'a str {
        &src[self.pos..self.end]
    }

    /// Merge `settings` into the object stored under `namespace`.
    pub fn merge_config(&mut self, namespace: &str, settings: Map<String, Value>) {
        let entry = self
            .config
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(existing) => existing.extend(settings),
            other => *other = Value::Object(settings),
        }
    }
}
