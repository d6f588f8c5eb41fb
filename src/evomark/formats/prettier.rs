//! Pretty-printer: serializes a tree back into canonical evomark source
//!
//!     The output does not depend on how the source was formatted, only on the tree and the
//!     layout tags the parse rules attached to bodies. Formatting is idempotent: printing the
//!     parse of printed output gives the same text again.

use super::formatting_rules::FormattingRules;
use crate::evomark::ast::{BodyLayout, NodeId, NodeKind, Tree};

pub struct Prettier {
    rules: FormattingRules,
    output: String,
    indent_level: usize,
}

impl Prettier {
    pub fn new(rules: FormattingRules) -> Self {
        Self {
            rules,
            output: String::new(),
            indent_level: 0,
        }
    }

    pub fn serialize(mut self, tree: &Tree) -> String {
        self.write_children(tree, tree.root());
        self.output
    }

    fn indent(&self) -> String {
        self.rules.indent_string.repeat(self.indent_level)
    }

    fn push_indent(&mut self) {
        let indent = self.indent();
        self.output.push_str(&indent);
    }

    /// Inline flow needs a space unless we are at the start, after whitespace or after `{`.
    fn space_for_inline(&mut self) {
        match self.output.chars().last() {
            None => {}
            Some(c) if c.is_whitespace() || c == '{' => {}
            Some(_) => self.output.push(' '),
        }
    }

    fn trim_trailing_blanks(&mut self) {
        let len = self.output.trim_end_matches(|c| c == ' ' || c == '\t').len();
        self.output.truncate(len);
    }

    fn write_children(&mut self, tree: &Tree, parent: NodeId) {
        let mut prev = None;
        for &child in tree.children(parent) {
            self.write_node(tree, child, prev);
            prev = Some(child);
        }
    }

    fn write_node(&mut self, tree: &Tree, id: NodeId, prev: Option<NodeId>) {
        let node = tree.node(id);
        match node.kind {
            NodeKind::Root => self.write_children(tree, id),
            NodeKind::Text | NodeKind::Literal => {
                if node.content.is_empty() {
                    return;
                }
                let prev_kind = prev.map(|p| tree.kind(p));
                let paragraph_break =
                    node.kind == NodeKind::Text && prev_kind == Some(NodeKind::Text);
                // `%x = ...` on one line would read back as an assignment
                let detached_equal = node.kind == NodeKind::Text
                    && prev_kind == Some(NodeKind::VarUse)
                    && node.content.starts_with('=');
                if paragraph_break {
                    self.trim_trailing_blanks();
                    self.output.push_str("\n\n");
                    self.push_indent();
                } else if detached_equal {
                    self.trim_trailing_blanks();
                    self.output.push('\n');
                    self.push_indent();
                } else {
                    self.space_for_inline();
                }
                self.write_multi_line(&node.content);
            }
            NodeKind::Func | NodeKind::Cmd => {
                self.space_for_inline();
                self.write_invocation(tree, id);
            }
            NodeKind::VarUse => {
                self.space_for_inline();
                self.output.push('%');
                self.output.push_str(&node.content);
            }
            NodeKind::VarAssign => {
                self.space_for_inline();
                self.output.push_str(&format!("%{} = ", node.content));
                self.write_children(tree, id);
            }
            NodeKind::Ref => {
                self.space_for_inline();
                self.output.push_str(&format!("@{}=", node.content));
                for &child in tree.children(id) {
                    if tree.kind(child) == NodeKind::Func {
                        self.write_invocation(tree, child);
                    }
                }
            }
            NodeKind::Sep => {
                self.trim_trailing_blanks();
                if self.output.ends_with('\n') {
                    self.output.push('\n');
                } else {
                    self.output.push_str(&"\n".repeat(node.sep_count()));
                }
                self.push_indent();
            }
            NodeKind::FuncParam => {
                let param = node
                    .content_obj
                    .as_ref()
                    .and_then(|v| serde_json::to_string(v).ok())
                    .unwrap_or_else(|| node.content.clone());
                self.output.push('(');
                self.output.push_str(&param);
                self.output.push(')');
            }
            NodeKind::Body | NodeKind::FuncBody => self.write_body(tree, id),
            NodeKind::Warning | NodeKind::Error | NodeKind::ConfigDict => {}
        }
    }

    /// `#name` or `$name` and its clauses. Results attached below a command are not source.
    fn write_invocation(&mut self, tree: &Tree, id: NodeId) {
        let node = tree.node(id);
        self.output
            .push(if node.kind == NodeKind::Cmd { '$' } else { '#' });
        self.output.push_str(&node.content);
        for &child in tree.children(id) {
            if matches!(
                tree.kind(child),
                NodeKind::FuncParam | NodeKind::Body | NodeKind::FuncBody
            ) {
                self.write_node(tree, child, None);
            }
        }
    }

    fn write_body(&mut self, tree: &Tree, id: NodeId) {
        let node = tree.node(id);
        // Rules like `code` and `config` keep the body text instead of parsing it
        let raw = (!node.content.is_empty()).then_some(node.content.as_str());
        match node.layout.unwrap_or(BodyLayout::Inline) {
            BodyLayout::DirectChild => {
                for &child in tree.children(id) {
                    if matches!(tree.kind(child), NodeKind::Func | NodeKind::Cmd) {
                        self.write_invocation(tree, child);
                    }
                }
            }
            BodyLayout::Code { open, close } => {
                self.output.push_str(&"=".repeat(open));
                self.output.push('>');
                match raw {
                    Some(raw) => self.output.push_str(raw),
                    None => self.write_children(tree, id),
                }
                self.output.push_str(&"=".repeat(close));
                self.output.push('|');
            }
            BodyLayout::Inline => {
                self.output.push('{');
                match raw {
                    Some(raw) => self.output.push_str(raw),
                    None => self.write_children(tree, id),
                }
                self.output.push('}');
            }
            BodyLayout::Block => {
                self.output.push('{');
                if let Some(raw) = raw {
                    self.output.push_str(raw);
                    self.output.push('}');
                    return;
                }
                self.output.push('\n');
                self.indent_level += 1;
                self.push_indent();
                self.write_children(tree, id);
                self.indent_level -= 1;
                let len = self.output.trim_end().len();
                self.output.truncate(len);
                self.output.push('\n');
                self.push_indent();
                self.output.push('}');
            }
        }
    }

    fn write_multi_line(&mut self, content: &str) {
        let indent = self.indent();
        let mut lines = content.split('\n');
        if let Some(first) = lines.next() {
            self.output.push_str(first);
        }
        for line in lines {
            self.output.push('\n');
            self.output.push_str(&indent);
            self.output.push_str(line);
        }
    }
}

/// Serialize `tree` with the default rules.
pub fn stringify(tree: &Tree) -> String {
    Prettier::new(FormattingRules::default()).serialize(tree)
}

pub fn stringify_with(tree: &Tree, rules: FormattingRules) -> String {
    Prettier::new(rules).serialize(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evomark::parsing::Parser;
    use crate::evomark::registry::RuleRegistry;

    fn fmt(src: &str) -> String {
        let registry = RuleRegistry::with_defaults();
        stringify(&Parser::new(&registry).parse(src).tree)
    }

    #[test]
    fn test_inline_flow() {
        assert_eq!(fmt("hello   #box{ a }x"), "hello #box{a} x");
        assert_eq!(fmt("a%v b"), "a %v b");
    }

    #[test]
    fn test_paragraphs_keep_blank_line() {
        assert_eq!(fmt("one\n\n\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_equal_after_var_use_stays_on_next_line() {
        assert_eq!(fmt("total %x\n= 42 units"), "total %x\n= 42 units");
        assert_eq!(
            fmt("#box{\n%x\n=y\n}"),
            "#box{\n  %x\n  =y\n}"
        );
    }

    #[test]
    fn test_sugar_prints_without_space() {
        assert_eq!(fmt("#box#box{x}"), "#box#box{x}");
        assert_eq!(fmt("#box #box{x}"), "#box #box{x}");
    }

    #[test]
    fn test_block_body_is_indented() {
        assert_eq!(
            fmt("#box{\n#box{\ninner\n}\n}"),
            "#box{\n  #box{\n    inner\n  }\n}"
        );
    }

    #[test]
    fn test_params_print_as_json() {
        assert_eq!(fmt("#box( 1 ){x}"), "#box(1){x}");
        assert_eq!(fmt("#box(yaml){x}"), "#box(\"yaml\"){x}");
    }

    #[test]
    fn test_raw_bodies_are_verbatim() {
        assert_eq!(fmt("#code==>  a  {\n b==|"), "#code==>  a  {\n b==|");
        assert_eq!(
            fmt("#config(yaml){\nkey: v\n}"),
            "#config(\"yaml\"){\nkey: v\n}"
        );
    }

    #[test]
    fn test_commands_and_vars() {
        assert_eq!(fmt("%x =\n $t{a   b}\n\n%x"), "%x = $t{a   b} %x");
        assert_eq!(fmt("$t{\na\n\n\nb\n}"), "$t{\n  a\n\n\n  b\n}");
    }

    #[test]
    fn test_ref() {
        assert_eq!(fmt("@fig=\n#box{x}"), "@fig=#box{x}");
    }

    #[test]
    fn test_custom_indent() {
        let registry = RuleRegistry::with_defaults();
        let tree = Parser::new(&registry).parse("#box{\nx\n}").tree;
        let rules = FormattingRules {
            indent_string: "\t".into(),
        };
        assert_eq!(stringify_with(&tree, rules), "#box{\n\tx\n}");
    }
}
