//! Execution Engine - runs commands and variables over a parsed tree
//!
//!     A pass flattens the tree into the list of `var_use`, `var_assign` and `cmd` nodes in
//!     document order (without descending into them) and processes that list once:
//!
//!     - `var_use` attaches the resolved value of the variable as a `literal` child
//!     - `var_assign` runs the exec rule of its command with a fresh [ObjectHost] and binds it
//!     - `cmd` runs its exec rule with no host
//!
//!     Warnings a step queued are written into the tree right after the step's node as a
//!     `$warning{...}` marker. A rule may raise the halt flag, which inserts a `$halted_here`
//!     marker and ends the pass. Both markers are one-shot: the next pass removes them before
//!     re-running the step they belong to, so repeated passes converge on the same tree.

use super::error::ExecError;
use super::host::ObjectHost;
use super::state::{ExecContext, ExecState};
use crate::evomark::ast::{BodyLayout, NodeId, NodeKind, Tree};
use crate::evomark::registry::RuleRegistry;
use serde_json::Value;
use tracing::{debug, trace};

pub const WARNING_CMD: &str = "warning";
pub const HALTED_CMD: &str = "halted_here";

/// Marker commands that are consumed instead of executed.
pub const ONE_SHOT_CMDS: [&str; 2] = [WARNING_CMD, HALTED_CMD];

/// Command-like nodes in document order, without descending into them.
pub fn get_cmd_list(tree: &Tree) -> Vec<NodeId> {
    let mut cmd_list = Vec::new();
    collect_cmds(tree, tree.root(), &mut cmd_list);
    cmd_list
}

fn collect_cmds(tree: &Tree, node: NodeId, cmd_list: &mut Vec<NodeId>) {
    for &child in tree.children(node) {
        if tree.kind(child).is_command() {
            cmd_list.push(child);
            continue;
        }
        collect_cmds(tree, child, cmd_list);
    }
}

fn is_one_shot(tree: &Tree, id: NodeId) -> bool {
    tree.kind(id) == NodeKind::Cmd && ONE_SHOT_CMDS.contains(&tree.content(id))
}

pub struct Executor<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> Executor<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Executor { registry }
    }

    /// Run one pass over `tree`, seeded with the persisted tables in `ctx`.
    pub fn exec(&self, tree: &mut Tree, ctx: ExecContext) -> Result<ExecState, ExecError> {
        let mut state = ExecState::new(ctx);
        for cmd in get_cmd_list(tree) {
            // Markers stripped by an earlier step are gone from the tree
            if !tree.is_attached(cmd) {
                continue;
            }
            trace!(
                node = %cmd,
                kind = %tree.kind(cmd),
                name = tree.content(cmd),
                cmd_pos = state.cmd_pos,
                "Executing"
            );

            match tree.kind(cmd) {
                NodeKind::VarUse => {
                    strip_markers_after(tree, cmd);
                    self.exec_var_use(tree, cmd, &mut state)?;
                }
                NodeKind::VarAssign => {
                    strip_markers_after(tree, cmd);
                    self.exec_var_assign(tree, cmd, &mut state)?;
                }
                NodeKind::Cmd if is_one_shot(tree, cmd) => {
                    consume_marker(tree, cmd);
                    continue;
                }
                NodeKind::Cmd => {
                    strip_markers_after(tree, cmd);
                    self.exec_cmd(tree, cmd, &mut state)?;
                }
                other => return Err(ExecError::UnexpectedNode(other)),
            }
            flush_warnings(tree, cmd, &mut state);

            if state.halt_flag {
                let already_halted = tree
                    .next_semantic_sibling(cmd)
                    .map(|next| tree.kind(next) == NodeKind::Cmd && tree.content(next) == HALTED_CMD)
                    .unwrap_or(false);
                if !already_halted {
                    let marker = tree.add_sibling(cmd, NodeKind::Cmd);
                    tree.node_mut(marker).set_content(HALTED_CMD);
                }
                debug!(cmd_pos = state.cmd_pos, "Execution halted");
                break;
            }
            state.cmd_pos += 1;
        }
        Ok(state)
    }

    fn exec_var_use(
        &self,
        tree: &mut Tree,
        cmd: NodeId,
        state: &mut ExecState,
    ) -> Result<(), ExecError> {
        let var_name = tree.content(cmd).to_string();
        let id = state
            .name_to_obj_host(&var_name)
            .ok_or_else(|| ExecError::UndefinedVariable(var_name.clone()))?;

        tree.remove_children_of_kind(cmd, NodeKind::Literal);
        let content = state.get_content(id);
        match (state.get_text(id), content) {
            (Some(text), Some(content)) => {
                let literal = tree.push_child(cmd, NodeKind::Literal);
                tree.node_mut(literal)
                    .set_content(text)
                    .set_content_obj(content);
            }
            _ => state.add_warning(format!("Variable \"{}\" is not defined", var_name)),
        }
        Ok(())
    }

    fn exec_var_assign(
        &self,
        tree: &mut Tree,
        cmd: NodeId,
        state: &mut ExecState,
    ) -> Result<(), ExecError> {
        let var_name = tree.content(cmd).to_string();
        let cmd_node = tree
            .children(cmd)
            .first()
            .copied()
            .filter(|&c| tree.kind(c) == NodeKind::Cmd)
            .ok_or_else(|| ExecError::MalformedAssignment(var_name.clone()))?;
        let rule_name = tree.content(cmd_node).to_string();
        let rule = self
            .registry
            .exec_rule(&rule_name)
            .ok_or(ExecError::UnknownRule(rule_name))?;

        let mut host = ObjectHost::new(var_name);
        rule(tree, cmd_node, state, Some(&mut host))?;
        state.bind(host);
        Ok(())
    }

    fn exec_cmd(&self, tree: &mut Tree, cmd: NodeId, state: &mut ExecState) -> Result<(), ExecError> {
        let rule_name = tree.content(cmd).to_string();
        let rule = self
            .registry
            .exec_rule(&rule_name)
            .ok_or(ExecError::UnknownRule(rule_name))?;
        rule(tree, cmd, state, None)
    }
}

/// Drop the one-shot markers a previous pass left right after `cmd`.
fn strip_markers_after(tree: &mut Tree, cmd: NodeId) {
    while let Some(next) = tree.next_sibling(cmd) {
        if !is_one_shot(tree, next) {
            break;
        }
        consume_marker(tree, next);
    }
}

/// Remove a marker, and the separator that follows a warning marker.
fn consume_marker(tree: &mut Tree, marker: NodeId) {
    if tree.content(marker) == WARNING_CMD {
        if let Some(sep) = tree.next_sibling(marker) {
            if tree.kind(sep) == NodeKind::Sep && tree.node(sep).sep_count() == 1 {
                tree.remove(sep);
            }
        }
    }
    tree.remove(marker);
}

/// Write queued warnings into the tree as `$warning{...}` right after `cmd`.
fn flush_warnings(tree: &mut Tree, cmd: NodeId, state: &mut ExecState) {
    if state.warning_list.is_empty() {
        return;
    }
    let message = state.warning_list.join("\n");
    state.warning_list.clear();

    let layout = if message.contains('\n') {
        BodyLayout::Block
    } else {
        BodyLayout::Inline
    };
    let marker = tree.add_sibling(cmd, NodeKind::Cmd);
    tree.node_mut(marker).set_content(WARNING_CMD);
    let body = tree.push_child(marker, NodeKind::Body);
    tree.node_mut(body).set_layout(layout);
    let literal = tree.push_child(body, NodeKind::Literal);
    tree.node_mut(literal).set_content(message);
    let sep = tree.add_sibling(marker, NodeKind::Sep);
    tree.node_mut(sep).set_content_obj(Value::from(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evomark::parsing::Parser;

    fn run(src: &str) -> (Tree, Result<ExecState, ExecError>) {
        let registry = RuleRegistry::with_defaults();
        let mut tree = Parser::new(&registry).parse(src).tree;
        let res = Executor::new(&registry).exec(&mut tree, ExecContext::default());
        (tree, res)
    }

    #[test]
    fn test_cmd_list_does_not_descend_into_commands() {
        let registry = RuleRegistry::with_defaults();
        let tree = Parser::new(&registry)
            .parse("#box{%a $t{%b}} %x = $t{%c}")
            .tree;
        let names: Vec<_> = get_cmd_list(&tree)
            .into_iter()
            .map(|id| (tree.kind(id), tree.content(id).to_string()))
            .collect();
        assert_eq!(
            names,
            vec![
                (NodeKind::VarUse, "a".to_string()),
                (NodeKind::Cmd, "t".to_string()),
                (NodeKind::VarAssign, "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_var_use_gets_literal() {
        let (tree, res) = run("%x = $t{hello}\n\n%x");
        let state = res.unwrap();
        let root = tree.root();
        let use_node = tree.children(root)[1];
        assert_eq!(tree.kind(use_node), NodeKind::VarUse);
        let literal = tree.children(use_node)[0];
        assert_eq!(tree.content(literal), "hello");
        assert_eq!(state.cmd_pos, 2);
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        let (_, res) = run("%nope");
        assert_eq!(res.unwrap_err(), ExecError::UndefinedVariable("nope".into()));
    }

    #[test]
    fn test_unknown_rule_is_fatal() {
        let (_, res) = run("$frobnicate{x}");
        assert_eq!(res.unwrap_err(), ExecError::UnknownRule("frobnicate".into()));
    }

    #[test]
    fn test_warning_flushed_after_command() {
        let (tree, res) = run("$save{%ghost}");
        res.unwrap();
        let root = tree.root();
        let kinds: Vec<_> = tree.children(root).iter().map(|&c| tree.kind(c)).collect();
        assert_eq!(kinds, vec![NodeKind::Cmd, NodeKind::Cmd, NodeKind::Sep]);
        let marker = tree.children(root)[1];
        assert_eq!(tree.content(marker), WARNING_CMD);
        let body = tree.children(marker)[0];
        let literal = tree.children(body)[0];
        assert_eq!(tree.content(literal), "Variable \"ghost\" is not defined");
    }

    #[test]
    fn test_second_pass_is_stable() {
        let registry = RuleRegistry::with_defaults();
        let mut tree = Parser::new(&registry).parse("$save{%ghost} after").tree;
        let executor = Executor::new(&registry);
        executor.exec(&mut tree, ExecContext::default()).unwrap();
        let first = tree.write_tree();
        executor.exec(&mut tree, ExecContext::default()).unwrap();
        assert_eq!(tree.write_tree(), first);
    }
}
