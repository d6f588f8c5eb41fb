//! Rule registry for parse-time and exec-time handlers
//!
//! This module maps names to the handlers the parser and the executor dispatch to.
//! There are three tables, each write-once per name:
//!
//! - function parse rules, looked up for `#name`
//! - command parse rules, looked up for `$name`
//! - exec rules, looked up for commands and variable assignments
//!
//! The registry is an explicit context object: build it once, then hand a reference to
//! [Parser](crate::evomark::parsing::Parser) and [Executor](crate::evomark::exec::Executor).

use crate::evomark::ast::{NodeId, Tree};
use crate::evomark::exec::{ExecError, ExecState, ObjectHost};
use crate::evomark::parsing::{ParseState, Parser};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Name of the transparent grouping rule every unknown function falls back to.
pub const BOX_RULE: &str = "box";

/// Parse-rule contract: returns whether the clause was consumed.
pub type ParseFn =
    Box<dyn Fn(&str, &mut ParseState, Option<&Value>, &Parser<'_>) -> bool + Send + Sync>;

/// Exec-rule contract: mutate the state and/or the tree below the command node.
pub type ExecFn = Box<
    dyn Fn(&mut Tree, NodeId, &mut ExecState, Option<&mut ObjectHost>) -> Result<(), ExecError>
        + Send
        + Sync,
>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTable {
    Func,
    Cmd,
    Exec,
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTable::Func => write!(f, "function"),
            RuleTable::Cmd => write!(f, "command"),
            RuleTable::Exec => write!(f, "exec"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateRule { table: RuleTable, name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateRule { table, name } => {
                write!(f, "Rule with name {} already in {} rules", name, table)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

pub struct RuleRegistry {
    func_rules: HashMap<String, ParseFn>,
    cmd_rules: HashMap<String, ParseFn>,
    exec_rules: HashMap<String, ExecFn>,
    init_state_config: Map<String, Value>,
}

impl RuleRegistry {
    /// Registry holding only the `box` rule.
    pub fn new() -> Self {
        let mut registry = RuleRegistry {
            func_rules: HashMap::new(),
            cmd_rules: HashMap::new(),
            exec_rules: HashMap::new(),
            init_state_config: Map::new(),
        };
        registry.func_rules.insert(
            BOX_RULE.to_string(),
            Box::new(crate::evomark::rules::func::parse_box),
        );
        registry
    }

    /// Registry with every built-in rule installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::evomark::rules::install_builtins(&mut registry);
        registry
    }

    /// Install a built-in function rule, replacing any rule of the same name.
    pub(crate) fn install_parse_rule<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&str, &mut ParseState, Option<&Value>, &Parser<'_>) -> bool + Send + Sync + 'static,
    {
        self.func_rules.insert(name.to_string(), Box::new(rule));
    }

    pub(crate) fn install_cmd_rule<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&str, &mut ParseState, Option<&Value>, &Parser<'_>) -> bool + Send + Sync + 'static,
    {
        self.cmd_rules.insert(name.to_string(), Box::new(rule));
    }

    pub(crate) fn install_exec_rule<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&mut Tree, NodeId, &mut ExecState, Option<&mut ObjectHost>) -> Result<(), ExecError>
            + Send
            + Sync
            + 'static,
    {
        self.exec_rules.insert(name.to_string(), Box::new(rule));
    }

    pub fn register_parse_rule<F>(&mut self, name: &str, rule: F) -> Result<(), RegistryError>
    where
        F: Fn(&str, &mut ParseState, Option<&Value>, &Parser<'_>) -> bool + Send + Sync + 'static,
    {
        insert_unique(&mut self.func_rules, RuleTable::Func, name, Box::new(rule))
    }

    pub fn register_cmd_rule<F>(&mut self, name: &str, rule: F) -> Result<(), RegistryError>
    where
        F: Fn(&str, &mut ParseState, Option<&Value>, &Parser<'_>) -> bool + Send + Sync + 'static,
    {
        insert_unique(&mut self.cmd_rules, RuleTable::Cmd, name, Box::new(rule))
    }

    pub fn register_exec_rule<F>(&mut self, name: &str, rule: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut Tree, NodeId, &mut ExecState, Option<&mut ObjectHost>) -> Result<(), ExecError>
            + Send
            + Sync
            + 'static,
    {
        insert_unique(&mut self.exec_rules, RuleTable::Exec, name, Box::new(rule))
    }

    /// Seed a parse-state config namespace with an empty object.
    pub fn add_config_namespace(&mut self, namespace: &str) {
        self.init_state_config
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    pub fn init_state_config(&self) -> &Map<String, Value> {
        &self.init_state_config
    }

    pub fn func_rule(&self, name: &str) -> Option<&ParseFn> {
        self.func_rules.get(name)
    }

    pub fn cmd_rule(&self, name: &str) -> Option<&ParseFn> {
        self.cmd_rules.get(name)
    }

    pub fn exec_rule(&self, name: &str) -> Option<&ExecFn> {
        self.exec_rules.get(name)
    }

    pub fn has_exec_rule(&self, name: &str) -> bool {
        self.exec_rules.contains_key(name)
    }

    pub fn list_func_rules(&self) -> Vec<String> {
        sorted_names(&self.func_rules)
    }

    pub fn list_cmd_rules(&self) -> Vec<String> {
        sorted_names(&self.cmd_rules)
    }

    pub fn list_exec_rules(&self) -> Vec<String> {
        sorted_names(&self.exec_rules)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn insert_unique<R>(
    table: &mut HashMap<String, R>,
    kind: RuleTable,
    name: &str,
    rule: R,
) -> Result<(), RegistryError> {
    if table.contains_key(name) {
        return Err(RegistryError::DuplicateRule {
            table: kind,
            name: name.to_string(),
        });
    }
    table.insert(name.to_string(), rule);
    Ok(())
}

fn sorted_names<R>(table: &HashMap<String, R>) -> Vec<String> {
    let mut names: Vec<_> = table.keys().cloned().collect();
    names.sort();
    names
}
