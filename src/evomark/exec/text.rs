//! Text synthesis from literal bodies

use super::host::HostId;
use super::state::ExecState;
use crate::evomark::ast::{NodeId, NodeKind, Tree};
use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static SPACE_AROUND_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());

/// Collapse blank runs, drop blanks around newlines and trim.
pub fn normalize_text(raw: &str) -> String {
    let collapsed = BLANK_RUN.replace_all(raw, " ");
    let joined = SPACE_AROUND_NEWLINE.replace_all(&collapsed, "\n");
    joined.trim().to_string()
}

/// Build the text of a flat `literal` / `var_use` / `sep` sequence.
///
/// Every variable is resolved first. When any of them is undefined, one warning per name is
/// queued and the text is `None`. The dependency list is returned either way, with `None`
/// for names that have no binding.
pub fn eval_to_text(
    tree: &Tree,
    nodes: &[NodeId],
    state: &mut ExecState,
) -> (Option<String>, Vec<Option<HostId>>) {
    let mut dependency = Vec::new();
    let mut undef = Vec::new();
    for &node in nodes {
        if tree.kind(node) != NodeKind::VarUse {
            continue;
        }
        let name = tree.content(node);
        match state.name_to_obj_host(name) {
            Some(id) => {
                state.get_content(id);
                if !state.host(id).is_defined() {
                    undef.push(name.to_string());
                }
                dependency.push(Some(id));
            }
            None => {
                undef.push(name.to_string());
                dependency.push(None);
            }
        }
    }

    if !undef.is_empty() {
        for name in undef {
            state.add_warning(format!("Variable \"{}\" is not defined", name));
        }
        return (None, dependency);
    }

    let mut res = String::new();
    let mut hosts = dependency.iter().flatten();
    for &node in nodes {
        match tree.kind(node) {
            NodeKind::VarUse => {
                if let Some(&id) = hosts.next() {
                    res.push_str(&state.get_text(id).unwrap_or_default());
                    res.push(' ');
                }
            }
            NodeKind::Literal => {
                res.push_str(tree.content(node));
                res.push(' ');
            }
            NodeKind::Sep => res.push_str(&"\n".repeat(tree.node(node).sep_count())),
            _ => {}
        }
    }
    (Some(normalize_text(&res)), dependency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evomark::exec::ObjectHost;
    use serde_json::json;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a \t b  \n\n  c "), "a b\n\nc");
        assert_eq!(normalize_text("x \n y"), "x\ny");
        assert_eq!(normalize_text("   "), "");
    }

    fn body(parts: &[(NodeKind, &str)]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let root = tree.root();
        let ids = parts
            .iter()
            .map(|&(kind, content)| {
                let id = tree.push_child(root, kind);
                if kind == NodeKind::Sep {
                    tree.node_mut(id).set_content_obj(json!(content.len()));
                } else {
                    tree.node_mut(id).set_content(content);
                }
                id
            })
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_concatenates_literals_vars_and_seps() {
        let (tree, nodes) = body(&[
            (NodeKind::Literal, "hello"),
            (NodeKind::VarUse, "name"),
            (NodeKind::Literal, "!"),
            (NodeKind::Sep, "xx"),
            (NodeKind::Literal, "bye"),
        ]);
        let mut state = ExecState::default();
        let mut host = ObjectHost::new("name");
        host.set_content(Some(json!("world")));
        let id = state.bind(host);

        let (text, deps) = eval_to_text(&tree, &nodes, &mut state);
        assert_eq!(text.as_deref(), Some("hello world !\n\nbye"));
        assert_eq!(deps, vec![Some(id)]);
        assert!(state.warning_list.is_empty());
    }

    #[test]
    fn test_undefined_vars_warn_and_yield_none() {
        let (tree, nodes) = body(&[
            (NodeKind::VarUse, "a"),
            (NodeKind::VarUse, "b"),
        ]);
        let mut state = ExecState::default();
        let id = state.bind(ObjectHost::new("b"));

        let (text, deps) = eval_to_text(&tree, &nodes, &mut state);
        assert_eq!(text, None);
        assert_eq!(deps, vec![None, Some(id)]);
        assert_eq!(
            state.warning_list,
            vec![
                "Variable \"a\" is not defined".to_string(),
                "Variable \"b\" is not defined".to_string()
            ]
        );
    }
}
