//! Testing utilities for tree assertions
//!
//! Checking a tree by indexing into children by hand gets long fast. The fluent API walks
//! the tree and reports the path of the node that failed:
//!
//! ```rust-example
//! use evomark::evomark::testing::assert_tree;
//!
//! assert_tree(&tree)
//!     .child_count(1)
//!     .child(0, |func| {
//!         func.kind(NodeKind::Func)
//!             .content("box")
//!             .child(0, |body| body.kind(NodeKind::FuncBody).kinds(&[NodeKind::Text]));
//!     });
//! ```

use crate::evomark::ast::{BodyLayout, NodeId, NodeKind, Tree};
use serde_json::Value;

/// Create an assertion builder rooted at the tree's root node
pub fn assert_tree(tree: &Tree) -> NodeAssertion<'_> {
    NodeAssertion {
        tree,
        id: tree.root(),
        context: "root".to_string(),
    }
}

/// Assert both trees dump to the same structure.
pub fn assert_same_shape(actual: &Tree, expected: &Tree) {
    let (actual, expected) = (actual.write_tree(), expected.write_tree());
    assert_eq!(
        actual, expected,
        "Trees differ\n--- actual\n{}--- expected\n{}",
        actual, expected
    );
}

pub struct NodeAssertion<'a> {
    tree: &'a Tree,
    id: NodeId,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(self, expected: NodeKind) -> Self {
        let actual = self.tree.kind(self.id);
        assert_eq!(
            actual, expected,
            "{}: expected {} node, found {}",
            self.context, expected, actual
        );
        self
    }

    pub fn content(self, expected: &str) -> Self {
        let actual = self.tree.content(self.id);
        assert_eq!(
            actual, expected,
            "{}: expected content {:?}, found {:?}",
            self.context, expected, actual
        );
        self
    }

    pub fn content_obj(self, expected: Value) -> Self {
        let actual = self.tree.node(self.id).content_obj.as_ref();
        assert_eq!(
            actual,
            Some(&expected),
            "{}: unexpected content_obj",
            self.context
        );
        self
    }

    pub fn layout(self, expected: BodyLayout) -> Self {
        let actual = self.tree.node(self.id).layout;
        assert_eq!(actual, Some(expected), "{}: unexpected layout", self.context);
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        let actual = self.tree.children(self.id).len();
        assert_eq!(
            actual,
            expected,
            "{}: expected {} children, found {}: [{}]",
            self.context,
            expected,
            actual,
            self.summarize_children()
        );
        self
    }

    /// Assert the exact kinds of the direct children, in order
    pub fn kinds(self, expected: &[NodeKind]) -> Self {
        let actual: Vec<NodeKind> = self
            .tree
            .children(self.id)
            .iter()
            .map(|&c| self.tree.kind(c))
            .collect();
        assert_eq!(actual, expected, "{}: unexpected child kinds", self.context);
        self
    }

    /// Assert on a specific child by index
    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let children = self.tree.children(self.id);
        assert!(
            index < children.len(),
            "{}: child index {} out of bounds (node has {} children)",
            self.context,
            index,
            children.len()
        );
        assertion(NodeAssertion {
            tree: self.tree,
            id: children[index],
            context: format!("{}.children[{}]", self.context, index),
        });
        self
    }

    fn summarize_children(&self) -> String {
        self.tree
            .children(self.id)
            .iter()
            .map(|&c| self.tree.node(c).write())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_walk() {
        let mut tree = Tree::new();
        let root = tree.root();
        let func = tree.push_child(root, NodeKind::Func);
        tree.node_mut(func).set_content("box");
        let body = tree.push_child(func, NodeKind::FuncBody);
        tree.node_mut(body).set_layout(BodyLayout::Inline);

        assert_tree(&tree).child_count(1).child(0, |f| {
            f.kind(NodeKind::Func)
                .content("box")
                .child(0, |b| {
                    b.kind(NodeKind::FuncBody).layout(BodyLayout::Inline).child_count(0);
                });
        });
    }

    #[test]
    #[should_panic(expected = "root.children[0]: expected cmd node, found func")]
    fn test_failure_names_path() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.push_child(root, NodeKind::Func);
        assert_tree(&tree).child(0, |f| {
            f.kind(NodeKind::Cmd);
        });
    }
}
