//! Object hosts: runtime bindings of variable names
//!
//!     A host either receives its value imperatively through [ObjectHost::set_content], or
//!     lazily: a rule stores an input, an input hash and an evaluation function with
//!     [ObjectHost::set_lazy], and the first [ObjectHost::get_content] call resolves the value
//!     through the cache table. Either way the value is frozen for the rest of the pass.

use super::state::CacheTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::sync::Arc;

/// Index of a host bound in an [ExecState](super::ExecState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(pub(crate) usize);

/// Type tag deciding how content is rendered as text and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Str,
    Obj,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Str => "str",
            DataType::Obj => "obj",
        }
    }
}

/// Pure evaluation function of a lazy host. `None` means no value could be produced.
pub type EvalFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
enum HostContent {
    Unset,
    /// Resolved for this pass; `None` records that nothing could be produced
    Frozen(Option<Value>),
}

#[derive(Clone)]
pub struct ObjectHost {
    pub defined: bool,
    pub var_name: String,
    pub data_type: DataType,
    pub use_cache: bool,
    pub input_hash: Option<String>,
    pub input: Value,
    pub eval_func: Option<EvalFn>,
    content: HostContent,
    /// Hosts this value was derived from, `None` where a name did not resolve
    pub dependency: Vec<Option<HostId>>,
}

impl fmt::Debug for ObjectHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHost")
            .field("defined", &self.defined)
            .field("var_name", &self.var_name)
            .field("data_type", &self.data_type)
            .field("use_cache", &self.use_cache)
            .field("input_hash", &self.input_hash)
            .field("content", &self.content)
            .field("dependency", &self.dependency)
            .finish_non_exhaustive()
    }
}

impl ObjectHost {
    pub fn new(var_name: impl Into<String>) -> Self {
        ObjectHost {
            defined: false,
            var_name: var_name.into(),
            data_type: DataType::Str,
            use_cache: false,
            input_hash: None,
            input: Value::Null,
            eval_func: None,
            content: HostContent::Unset,
            dependency: Vec::new(),
        }
    }

    /// Turn this host into a cached lazy value keyed by `input_hash`.
    pub fn set_lazy(&mut self, input: Value, input_hash: String, eval_func: EvalFn) {
        self.use_cache = true;
        self.input = input;
        self.input_hash = Some(input_hash);
        self.eval_func = Some(eval_func);
    }

    /// Frozen content, resolving a lazy host through `cache` on first access.
    pub fn get_content(&mut self, cache: &mut CacheTable) -> Option<&Value> {
        if self.content == HostContent::Unset {
            if !self.use_cache {
                return None;
            }
            let res = eval_and_cache(self, cache);
            self.defined = res.is_some();
            self.content = HostContent::Frozen(res);
        }
        match &self.content {
            HostContent::Frozen(value) => value.as_ref(),
            HostContent::Unset => None,
        }
    }

    /// Assign content directly. The host is defined iff `content` is a value.
    pub fn set_content(&mut self, content: Option<Value>) {
        self.defined = content.is_some();
        self.content = HostContent::Frozen(content);
    }

    /// Content rendered as text according to the type tag.
    pub fn get_text(&mut self, cache: &mut CacheTable) -> Option<String> {
        let data_type = self.data_type;
        let content = self.get_content(cache)?;
        match (data_type, content) {
            (DataType::Str, Value::String(s)) => Some(s.clone()),
            (_, other) => serde_json::to_string(other).ok(),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn is_resolved(&self) -> bool {
        self.content != HostContent::Unset
    }
}

/// Content address of `input` for the rule named `caller`.
///
/// Lowercase hex SHA3-256 of `caller + "$" + json(input)`.
pub fn get_hash(input: &Value, caller: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(caller.as_bytes());
    hasher.update(b"$");
    hasher.update(input.to_string().as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Look the host's input hash up in `cache`, evaluating and storing on a miss.
///
/// A `None` result is not stored, so a later pass evaluates again.
pub fn eval_and_cache(host: &ObjectHost, cache: &mut CacheTable) -> Option<Value> {
    let hash = host.input_hash.as_ref();
    if let Some(cached) = hash.and_then(|h| cache.get(h)) {
        return Some(cached.clone());
    }
    let eval_func = host.eval_func.as_ref()?;
    let res = eval_func(&host.input)?;
    if let Some(hash) = hash {
        cache.insert(hash.clone(), res.clone());
    }
    Some(res)
}
