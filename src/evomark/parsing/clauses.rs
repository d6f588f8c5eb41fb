//! Names, parameter clauses and body clauses
//!
//!     These scanners work on the byte slice of the source. Every syntax character is ASCII,
//!     so byte offsets always land on char boundaries when we cut slices.

use super::state::ParseState;
use crate::evomark::ast::{BodyLayout, NodeId, NodeKind};
use serde_json::Value;

pub fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// True when `pos` holds `sigil` followed by a character that can start a name.
pub fn starts_construct(src: &str, pos: usize, end: usize, sigil: u8) -> bool {
    let bytes = src.as_bytes();
    pos + 1 < end && bytes[pos] == sigil && is_name_start(bytes[pos + 1])
}

/// Consume a name at the current position. May return an empty string.
pub fn parse_func_name(src: &str, state: &mut ParseState) -> String {
    let bytes = src.as_bytes();
    let start = state.pos;
    let mut i = start;
    while i < state.end && is_name_char(bytes[i]) {
        i += 1;
    }
    state.pos = i;
    src[start..i].to_string()
}

/// Parse `( ... )` into a `func_param` child of the current node.
///
/// Returns the parameter value, or `None` without consuming anything when there is no
/// well-formed clause here.
pub fn parse_func_param(src: &str, state: &mut ParseState) -> Option<Value> {
    let bytes = src.as_bytes();
    let open = state.pos;
    if open >= state.end || bytes[open] != b'(' {
        return None;
    }
    let close = find_param_close(bytes, open + 1, state.end)?;
    let raw = src[open + 1..close].trim();
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    let node = state.push_node(NodeKind::FuncParam);
    let param = state.tree.node_mut(node);
    param.set_content(raw).set_content_obj(value.clone());
    param.delim = Some(open + 1..close);
    state.pos = close + 1;
    Some(value)
}

fn find_param_close(bytes: &[u8], from: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = from;
    while i < end {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'(' => depth += 1,
                b')' if depth == 0 => return Some(i),
                b')' => depth -= 1,
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Parse a braced or fenced body into a child of kind `kind` of the current node.
///
/// The body's `delim` holds the inner span; the caller re-slices it to parse the content.
pub fn parse_func_body(src: &str, state: &mut ParseState, kind: NodeKind) -> Option<NodeId> {
    let bytes = src.as_bytes();
    let open = state.pos;
    if open >= state.end {
        return None;
    }
    let (inner, next, layout) = match bytes[open] {
        b'{' => {
            let close = find_brace_close(bytes, open + 1, state.end)?;
            let layout = if bytes[open + 1..close].contains(&b'\n') {
                BodyLayout::Block
            } else {
                BodyLayout::Inline
            };
            (open + 1..close, close + 1, layout)
        }
        b'=' => {
            let mut i = open;
            while i < state.end && bytes[i] == b'=' {
                i += 1;
            }
            if i >= state.end || bytes[i] != b'>' {
                return None;
            }
            let fence_len = i - open;
            let content_start = i + 1;
            let fence = format!("{}|", "=".repeat(fence_len));
            let found = src[content_start..state.end].find(&fence)?;
            let content_end = content_start + found;
            (
                content_start..content_end,
                content_end + fence.len(),
                BodyLayout::Code {
                    open: fence_len,
                    close: fence_len,
                },
            )
        }
        _ => return None,
    };

    let node = state.push_node(kind);
    let body = state.tree.node_mut(node);
    body.delim = Some(inner);
    body.set_layout(layout);
    state.pos = next;
    Some(node)
}

fn find_brace_close(bytes: &[u8], from: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = from;
    while i < end {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}
