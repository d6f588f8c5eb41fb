//! Parser Engine - recursive descent over the evomark grammar
//!
//!     The engine walks the source once. At every position [Parser::parse_core] tries, in
//!     order: inline text, a function call (`#name(param){body}`), a reference
//!     (`@name = #func{...}`), a command (`$name{...}`) and a variable (`%name` or
//!     `%name = $cmd{...}`). If nothing applies the parse is aborted: malformed input is a
//!     hard stop reported through [ParseOutput::complete], not an error value.
//!
//!     Bodies are not parsed by the engine itself. Each function or command name resolves to
//!     a parse rule in the [RuleRegistry]; the engine narrows the scan window to the body span
//!     and hands control to that rule, which may recurse into [Parser::parse_core] (like the
//!     `box` rule does) or consume the raw text (like `code` and `config` do).
//!
//!     Unknown function names fall back to `box`, so `parse_func` never fails once `#` and a
//!     name character were seen. Unknown command names fall back to the literal body parser.

use super::clauses::{parse_func_body, parse_func_name, parse_func_param, starts_construct};
use super::state::ParseState;
use crate::evomark::ast::{BodyLayout, NodeKind, Tree};
use crate::evomark::registry::{RuleRegistry, BOX_RULE};
use crate::evomark::rules::literal::parse_literal_body;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Result of [Parser::parse].
#[derive(Debug)]
pub struct ParseOutput {
    pub tree: Tree,
    /// Namespace -> settings collected by config rules
    pub config: Map<String, Value>,
    /// False when the parse was aborted on input no rule could consume, at any depth
    pub complete: bool,
}

pub struct Parser<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Parser { registry }
    }

    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    pub fn parse(&self, src: &str) -> ParseOutput {
        let mut state = ParseState::new(src);
        state.config = self.registry.init_state_config().clone();
        self.parse_core(src, &mut state);
        ParseOutput {
            tree: state.tree,
            config: state.config,
            complete: !state.aborted,
        }
    }

    /// Top-level dispatch loop over the active window.
    pub fn parse_core(&self, src: &str, state: &mut ParseState) -> bool {
        let bytes = src.as_bytes();
        while state.pos < state.end {
            if bytes[state.pos] == b'\n' {
                state.pos += 1;
                continue;
            }
            if self.parse_inline(src, state) {
                continue;
            }
            if self.parse_func(src, state) {
                continue;
            }
            if self.parse_ref(src, state) {
                continue;
            }
            if self.parse_cmd(src, state) {
                continue;
            }
            if self.parse_var(src, state) {
                continue;
            }
            warn!(pos = state.pos, "There is no available rule. Abort.");
            state.aborted = true;
            return false;
        }
        true
    }

    /// Plain text up to the next construct or paragraph break.
    pub fn parse_inline(&self, src: &str, state: &mut ParseState) -> bool {
        let bytes = src.as_bytes();
        let start = state.pos;
        let mut i = start;
        while i < state.end {
            match bytes[i] {
                b'#' | b'@' => break,
                b'$' | b'%' if starts_construct(src, i, state.end, bytes[i]) => break,
                b'\n' if i + 1 < state.end && bytes[i + 1] == b'\n' => {
                    i += 1;
                    break;
                }
                _ => i += 1,
            }
        }

        if i == start {
            return false;
        }
        let content = normalize_lines(&src[start..i]);
        if !content.is_empty() {
            let node = state.push_node(NodeKind::Text);
            state.tree.node_mut(node).set_content(content);
        }
        state.pos = i;
        true
    }

    /// `#name` followed by parameter and body clauses.
    pub fn parse_func(&self, src: &str, state: &mut ParseState) -> bool {
        let start = state.pos;
        if !starts_construct(src, start, state.end, b'#') {
            return false;
        }
        state.pos += 1;
        let func_name = parse_func_name(src, state);

        let rule = match self.registry.func_rule(&func_name) {
            Some(rule) => Some(rule),
            None => {
                debug!(name = %func_name, "Cannot find rule, falling back to box");
                self.registry.func_rule(BOX_RULE)
            }
        };

        let func_node = state.push_node(NodeKind::Func);
        state.tree.node_mut(func_node).set_content(func_name);
        state.curr_node = func_node;

        let mut param: Option<Value> = None;
        loop {
            let new_param = parse_func_param(src, state);
            let got_param = new_param.is_some();
            if got_param {
                param = new_param;
            }
            let body_node = parse_func_body(src, state, NodeKind::FuncBody);

            if !got_param && body_node.is_none() {
                // `#a#b{...}` reads as `#a{#b{...}}` while `a` has nothing but parameters
                let all_param_node = state
                    .tree
                    .children(func_node)
                    .iter()
                    .all(|&c| state.tree.kind(c) == NodeKind::FuncParam);
                if all_param_node && starts_construct(src, state.pos, state.end, b'#') {
                    let body = state.tree.push_child(func_node, NodeKind::FuncBody);
                    state.tree.node_mut(body).set_layout(BodyLayout::DirectChild);
                    state.curr_node = body;
                    self.parse_func(src, state);
                    state.curr_node = func_node;
                    continue;
                }
                break;
            }

            if let Some(body) = body_node {
                let Some(delim) = state.tree.node(body).delim.clone() else {
                    continue;
                };
                let saved = state.set_local_state(delim.start, delim.start, delim.end, body);
                match rule {
                    Some(rule) => {
                        rule(src, state, param.as_ref(), self);
                    }
                    None => {
                        self.parse_core(src, state);
                    }
                }
                state.restore_state(saved);
            }
        }

        state.curr_node = state.tree.parent(func_node).unwrap_or(state.tree.root());
        true
    }

    /// `@name = #func...`
    pub fn parse_ref(&self, src: &str, state: &mut ParseState) -> bool {
        let bytes = src.as_bytes();
        if state.pos >= state.end || bytes[state.pos] != b'@' {
            return false;
        }
        state.pos += 1;
        let ref_name = parse_func_name(src, state);
        let message = format!("\"@{} = \" must be followed with a function", ref_name);

        let mut i = state.pos;
        let mut found_equal = false;
        while i < state.end {
            match bytes[i] {
                b'=' => {
                    found_equal = true;
                    i += 1;
                    break;
                }
                b' ' => i += 1,
                _ => break,
            }
        }
        if !found_equal {
            state.push_warning_node_to_root(message);
            return true;
        }

        i = skip_blank(bytes, i, state.end);
        state.pos = i;
        if i >= state.end || bytes[i] != b'#' {
            state.push_warning_node_to_root(message);
            return true;
        }

        let ref_node = state.push_node(NodeKind::Ref);
        state.tree.node_mut(ref_node).set_content(ref_name);
        state.curr_node = ref_node;
        if !self.parse_func(src, state) {
            state.push_warning_node_to_root(message);
        }
        state.curr_node = state.tree.parent(ref_node).unwrap_or(state.tree.root());
        true
    }

    /// `$name` followed by parameter and body clauses. No sugar chaining for commands.
    pub fn parse_cmd(&self, src: &str, state: &mut ParseState) -> bool {
        if !starts_construct(src, state.pos, state.end, b'$') {
            return false;
        }
        state.pos += 1;
        let cmd_name = parse_func_name(src, state);
        let rule = self.registry.cmd_rule(&cmd_name);

        let cmd_node = state.push_node(NodeKind::Cmd);
        state.tree.node_mut(cmd_node).set_content(cmd_name);
        state.curr_node = cmd_node;

        let mut param: Option<Value> = None;
        loop {
            let new_param = parse_func_param(src, state);
            let got_param = new_param.is_some();
            if got_param {
                param = new_param;
            }
            let body_node = parse_func_body(src, state, NodeKind::Body);
            if !got_param && body_node.is_none() {
                break;
            }
            if let Some(body) = body_node {
                let Some(delim) = state.tree.node(body).delim.clone() else {
                    continue;
                };
                let saved = state.set_local_state(delim.start, delim.start, delim.end, body);
                match rule {
                    Some(rule) => {
                        rule(src, state, param.as_ref(), self);
                    }
                    None => {
                        parse_literal_body(src, state, param.as_ref(), self);
                    }
                }
                state.restore_state(saved);
            }
        }

        state.curr_node = state.tree.parent(cmd_node).unwrap_or(state.tree.root());
        true
    }

    /// `%name` (use) or `%name = $cmd...` (assignment).
    pub fn parse_var(&self, src: &str, state: &mut ParseState) -> bool {
        let bytes = src.as_bytes();
        if !starts_construct(src, state.pos, state.end, b'%') {
            return false;
        }
        state.pos += 1;
        let var_name = parse_func_name(src, state);

        let mut i = state.pos;
        while i < state.end && bytes[i] == b' ' {
            i += 1;
        }
        if i >= state.end || bytes[i] != b'=' {
            let node = state.push_node(NodeKind::VarUse);
            state.tree.node_mut(node).set_content(var_name);
            return true;
        }

        state.pos = skip_blank(bytes, i + 1, state.end);
        let assign = state.push_node(NodeKind::VarAssign);
        state.tree.node_mut(assign).set_content(var_name.clone());
        state.curr_node = assign;
        let found_cmd = self.parse_cmd(src, state);
        state.curr_node = state.tree.parent(assign).unwrap_or(state.tree.root());
        if !found_cmd {
            state.tree.remove(assign);
            state.push_warning_node_to_root(format!(
                "\"%{} = \" must be followed with a command",
                var_name
            ));
        }
        true
    }
}

fn skip_blank(bytes: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && matches!(bytes[i], b' ' | b'\n') {
        i += 1;
    }
    i
}

/// Trim every line and drop the empty ones.
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
