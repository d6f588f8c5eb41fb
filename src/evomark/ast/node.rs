//! Node payload types
//!
//!     A [Node] is the unit stored in the [Tree](super::Tree) arena. It carries a fixed
//!     [NodeKind] tag, a string payload, an optional structured payload and the byte span it
//!     was parsed from. Structure (parent and children) lives next to the payload but is only
//!     mutated through the tree so the back-references stay consistent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::Range as ByteRange;

/// Stable handle to a node inside a [Tree](super::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed vocabulary of node tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Func,
    FuncParam,
    FuncBody,
    Body,
    Text,
    Literal,
    Sep,
    Ref,
    Cmd,
    VarUse,
    VarAssign,
    Warning,
    Error,
    ConfigDict,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Func => "func",
            NodeKind::FuncParam => "func_param",
            NodeKind::FuncBody => "func_body",
            NodeKind::Body => "body",
            NodeKind::Text => "text",
            NodeKind::Literal => "literal",
            NodeKind::Sep => "sep",
            NodeKind::Ref => "ref",
            NodeKind::Cmd => "cmd",
            NodeKind::VarUse => "var_use",
            NodeKind::VarAssign => "var_assign",
            NodeKind::Warning => "warning",
            NodeKind::Error => "error",
            NodeKind::ConfigDict => "config_dict",
        }
    }

    /// Kinds the executor collects instead of descending into.
    pub fn is_command(self) -> bool {
        matches!(self, NodeKind::VarUse | NodeKind::Cmd | NodeKind::VarAssign)
    }

    pub fn is_body(self) -> bool {
        matches!(self, NodeKind::Body | NodeKind::FuncBody)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the pretty-printer lays out a body. Tagged by whichever rule produced the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLayout {
    /// `{...}` on one line
    Inline,
    /// `{`, indented children, `}`
    Block,
    /// Wrapping body elided, the sole child function is printed in place (`#a#b{}`)
    DirectChild,
    /// Fenced with `={open}>` ... `={close}|`
    Code { open: usize, close: usize },
}

/// One tree node. Structural links are private to keep them in sync with the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub content: String,
    pub content_obj: Option<Value>,
    /// Source span, `None` for synthetic nodes
    pub delim: Option<ByteRange<usize>>,
    pub layout: Option<BodyLayout>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) removed: bool,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            content: String::new(),
            content_obj: None,
            delim: None,
            layout: None,
            children: Vec::new(),
            parent: None,
            removed: false,
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = content.into();
        self
    }

    pub fn set_content_obj(&mut self, content_obj: Value) -> &mut Self {
        self.content_obj = Some(content_obj);
        self
    }

    pub fn set_layout(&mut self, layout: BodyLayout) -> &mut Self {
        self.layout = Some(layout);
        self
    }

    /// Newline repeat count carried by a `sep` node.
    pub fn sep_count(&self) -> usize {
        self.content_obj
            .as_ref()
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(1)
    }

    /// One line description used by the tree dump.
    pub fn write(&self) -> String {
        if self.content.is_empty() {
            return self.kind.to_string();
        }
        format!("{} {}", self.kind, self.content).replace('\n', "\\n")
    }
}
