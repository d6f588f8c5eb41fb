//! Built-in function rules: `box`, `code` and `config`

use crate::evomark::ast::NodeKind;
use crate::evomark::parsing::{ParseState, Parser};
use serde_json::{Map, Value};

/// Parse-state namespace the `config` rule writes to.
pub const CONFIG_NAMESPACE: &str = "env";

/// Transparent grouping: the body is ordinary nested markup.
pub fn parse_box(src: &str, state: &mut ParseState, _param: Option<&Value>, parser: &Parser<'_>) -> bool {
    parser.parse_core(src, state)
}

/// Keep the body as raw text on the body node.
pub fn parse_code(
    src: &str,
    state: &mut ParseState,
    _param: Option<&Value>,
    _parser: &Parser<'_>,
) -> bool {
    consume_raw_body(src, state);
    true
}

/// `#config(lang){...}` with `lang` one of `json` (default), `yaml` or `string`.
pub fn parse_env_config(
    src: &str,
    state: &mut ParseState,
    param: Option<&Value>,
    _parser: &Parser<'_>,
) -> bool {
    parse_config(src, state, param, CONFIG_NAMESPACE)
}

pub fn parse_config(src: &str, state: &mut ParseState, param: Option<&Value>, namespace: &str) -> bool {
    let raw = consume_raw_body(src, state);
    let lang = match param {
        Some(Value::String(lang)) => lang.as_str(),
        Some(Value::Object(obj)) => obj.get("lang").and_then(Value::as_str).unwrap_or("json"),
        _ => "json",
    };

    match parse_dict(&raw, lang) {
        Ok(dict) => {
            let node = state.push_node(NodeKind::ConfigDict);
            state
                .tree
                .node_mut(node)
                .set_content(namespace)
                .set_content_obj(Value::Object(dict.clone()));
            state.merge_config(namespace, dict);
        }
        Err(message) => {
            state.push_warning_node(message);
        }
    }
    true
}

/// Parse a config block into a dictionary.
pub fn parse_dict(raw: &str, lang: &str) -> Result<Map<String, Value>, String> {
    let value: Value = match lang {
        "json" => serde_json::from_str(raw).map_err(|e| format!("Cannot parse json config: {}", e))?,
        "string" => serde_json::from_str(&format!("{{\n{}\n}}", raw))
            .map_err(|e| format!("Cannot parse string config: {}", e))?,
        "yaml" => serde_yaml::from_str(raw).map_err(|e| format!("Cannot parse yaml config: {}", e))?,
        other => return Err(format!("Unsupported config language \"{}\"", other)),
    };
    match value {
        Value::Object(dict) => Ok(dict),
        Value::Null => Ok(Map::new()),
        _ => Err(format!("{} config must be a dictionary", lang)),
    }
}

/// Record the active window on the body node and move past it.
fn consume_raw_body(src: &str, state: &mut ParseState) -> String {
    let raw = state.slice_range(src).to_string();
    let body = state.curr_node;
    state.tree.node_mut(body).set_content(raw.clone());
    state.pos = state.end;
    raw
}
