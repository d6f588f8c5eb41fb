//! Built-in commands
//!
//! Every built-in command parses its body with the literal body parser; the behavior lives
//! in the exec rule:
//!
//! - `t` assigns the body text
//! - `init` reuses a bound or saved value, else assigns the body text and saves it
//! - `save` persists the variables named in the body
//! - `upper` uppercases the body text, cached by content hash
//! - `json` parses the body text into an `obj` value
//! - `require` halts the pass while a named variable is undefined

use crate::evomark::ast::{NodeId, NodeKind, Tree};
use crate::evomark::exec::{eval_to_text, get_hash, DataType, ExecError, ExecState, ObjectHost};
use serde_json::{json, Value};
use std::sync::Arc;

pub type ExecRuleFn =
    fn(&mut Tree, NodeId, &mut ExecState, Option<&mut ObjectHost>) -> Result<(), ExecError>;

pub const BUILTIN_COMMANDS: [(&str, ExecRuleFn); 6] = [
    ("t", exec_t),
    ("init", exec_init),
    ("save", exec_save),
    ("upper", exec_upper),
    ("json", exec_json),
    ("require", exec_require),
];

pub fn get_first_body_node(tree: &Tree, cmd: NodeId) -> Option<NodeId> {
    tree.first_body(cmd)
}

fn body_items(tree: &Tree, cmd: NodeId) -> Vec<NodeId> {
    get_first_body_node(tree, cmd)
        .map(|body| tree.children(body).to_vec())
        .unwrap_or_default()
}

fn body_var_names(tree: &Tree, cmd: NodeId) -> Vec<String> {
    body_items(tree, cmd)
        .into_iter()
        .filter(|&n| tree.kind(n) == NodeKind::VarUse)
        .map(|n| tree.content(n).to_string())
        .collect()
}

/// Assign the text of the command body to `host` as a `str`.
pub fn store_literal_to_host(tree: &Tree, cmd: NodeId, state: &mut ExecState, host: &mut ObjectHost) {
    let nodes = body_items(tree, cmd);
    let (text, dependency) = eval_to_text(tree, &nodes, state);
    host.data_type = DataType::Str;
    host.dependency = dependency;
    host.set_content(text.map(Value::String));
}

/// Replace the result literal attached to a bare command.
fn attach_result(tree: &mut Tree, cmd: NodeId, text: String) {
    tree.remove_children_of_kind(cmd, NodeKind::Literal);
    let literal = tree.push_child(cmd, NodeKind::Literal);
    tree.node_mut(literal).set_content(text);
}

pub fn exec_t(
    tree: &mut Tree,
    cmd: NodeId,
    state: &mut ExecState,
    assigned: Option<&mut ObjectHost>,
) -> Result<(), ExecError> {
    if let Some(host) = assigned {
        store_literal_to_host(tree, cmd, state, host);
    }
    Ok(())
}

pub fn exec_init(
    tree: &mut Tree,
    cmd: NodeId,
    state: &mut ExecState,
    assigned: Option<&mut ObjectHost>,
) -> Result<(), ExecError> {
    let Some(host) = assigned else {
        return Ok(());
    };

    if let Some(existing) = state.name_to_obj_host(&host.var_name) {
        host.data_type = state.host(existing).data_type;
        host.dependency = vec![Some(existing)];
        host.set_content(state.get_content(existing));
        return Ok(());
    }

    if let Some(saved) = state.load_saved_var(&host.var_name).cloned() {
        match saved.decode(&host.var_name) {
            Ok(value) => {
                host.data_type = saved.data_type;
                host.set_content(Some(value));
                return Ok(());
            }
            Err(err) => state.add_warning(err.to_string()),
        }
    }

    store_literal_to_host(tree, cmd, state, host);
    if host.is_defined() {
        state.save_host(host);
    }
    Ok(())
}

pub fn exec_save(
    tree: &mut Tree,
    cmd: NodeId,
    state: &mut ExecState,
    _assigned: Option<&mut ObjectHost>,
) -> Result<(), ExecError> {
    for name in body_var_names(tree, cmd) {
        match state.name_to_obj_host(&name) {
            Some(id) => state.save_var(id),
            None => state.add_warning(format!("Variable \"{}\" is not defined", name)),
        }
    }
    Ok(())
}

fn uppercase(input: &Value) -> Option<Value> {
    input
        .get("text")
        .and_then(Value::as_str)
        .map(|text| Value::String(text.to_uppercase()))
}

pub fn exec_upper(
    tree: &mut Tree,
    cmd: NodeId,
    state: &mut ExecState,
    assigned: Option<&mut ObjectHost>,
) -> Result<(), ExecError> {
    let nodes = body_items(tree, cmd);
    let (text, dependency) = eval_to_text(tree, &nodes, state);
    let Some(text) = text else {
        return Ok(());
    };
    let input = json!({ "text": text, "cmd_pos": state.cmd_pos });
    let input_hash = get_hash(&input, "upper");

    match assigned {
        Some(host) => {
            host.data_type = DataType::Str;
            host.dependency = dependency;
            host.set_lazy(input, input_hash, Arc::new(uppercase));
        }
        None => {
            let res = match state.read_cache(&input_hash) {
                Some(cached) => cached.clone(),
                None => {
                    let Some(res) = uppercase(&input) else {
                        return Ok(());
                    };
                    state.save_cache(input_hash, res.clone());
                    res
                }
            };
            if let Value::String(res) = res {
                attach_result(tree, cmd, res);
            }
        }
    }
    Ok(())
}

pub fn exec_json(
    tree: &mut Tree,
    cmd: NodeId,
    state: &mut ExecState,
    assigned: Option<&mut ObjectHost>,
) -> Result<(), ExecError> {
    let nodes = body_items(tree, cmd);
    let (text, dependency) = eval_to_text(tree, &nodes, state);
    let Some(text) = text else {
        return Ok(());
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => {
            if let Some(host) = assigned {
                host.data_type = DataType::Obj;
                host.dependency = dependency;
                host.set_content(Some(value));
            }
        }
        Err(err) => state.add_warning(format!("Malformed JSON: {}", err)),
    }
    Ok(())
}

pub fn exec_require(
    tree: &mut Tree,
    cmd: NodeId,
    state: &mut ExecState,
    _assigned: Option<&mut ObjectHost>,
) -> Result<(), ExecError> {
    let mut missing = Vec::new();
    for name in body_var_names(tree, cmd) {
        let defined = match state.name_to_obj_host(&name) {
            Some(id) => {
                state.get_content(id);
                state.host(id).is_defined()
            }
            None => false,
        };
        if !defined {
            missing.push(name);
        }
    }
    if !missing.is_empty() {
        state.add_fatal(format!(
            "Waiting for required variables: {}",
            missing.join(", ")
        ));
    }
    Ok(())
}
