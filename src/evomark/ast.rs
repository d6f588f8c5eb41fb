//! Document tree
//!
//!     The universal tree shared by the parser, the executor and the pretty-printer. Child
//!     order is document order, which is also execution order and render order.
//!
//!     The tree is an arena ([Tree]) of [Node]s addressed by [NodeId]. Parsing creates
//!     source-derived nodes (with a `delim` span); execution adds synthetic ones (resolved
//!     literals, warning and halt markers, separators) and removes one-shot markers in place.

mod node;
mod tree;

pub use node::{BodyLayout, Node, NodeId, NodeKind};
pub use tree::Tree;
