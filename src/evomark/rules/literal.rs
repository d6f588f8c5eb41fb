//! Literal body parser
//!
//! Command bodies are not parsed as markup. They are cut into a flat run of `literal`,
//! `var_use` and `sep` nodes, the shape [eval_to_text](crate::evomark::exec::eval_to_text)
//! consumes.

use crate::evomark::ast::NodeKind;
use crate::evomark::parsing::clauses::{parse_func_name, starts_construct};
use crate::evomark::parsing::{normalize_lines, ParseState, Parser};
use serde_json::Value;

/// Parse the active window as literal text with `%name` uses and paragraph separators.
pub fn parse_literal_body(
    src: &str,
    state: &mut ParseState,
    _param: Option<&Value>,
    _parser: &Parser<'_>,
) -> bool {
    let bytes = src.as_bytes();
    let end = state.end;
    let mut i = state.pos;
    let mut run_start = i;

    while i < end {
        if starts_construct(src, i, end, b'%') {
            push_literal(state, &src[run_start..i]);
            state.pos = i + 1;
            let var_name = parse_func_name(src, state);
            let node = state.push_node(NodeKind::VarUse);
            state.tree.node_mut(node).set_content(var_name);
            i = state.pos;
            run_start = i;
            continue;
        }
        if bytes[i] == b'\n' {
            let mut j = i;
            let mut newlines = 0;
            while j < end && matches!(bytes[j], b'\n' | b' ' | b'\t' | b'\r') {
                if bytes[j] == b'\n' {
                    newlines += 1;
                }
                j += 1;
            }
            if newlines >= 2 {
                push_literal(state, &src[run_start..i]);
                let sep = state.push_node(NodeKind::Sep);
                state.tree.node_mut(sep).set_content_obj(Value::from(newlines));
                run_start = j;
            }
            i = j;
            continue;
        }
        i += 1;
    }
    push_literal(state, &src[run_start..end]);
    state.pos = end;
    true
}

fn push_literal(state: &mut ParseState, raw: &str) {
    let content = normalize_lines(raw);
    if content.is_empty() {
        return;
    }
    let node = state.push_node(NodeKind::Literal);
    state.tree.node_mut(node).set_content(content);
}
