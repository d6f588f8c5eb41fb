//! Execution state and the persisted tables it is seeded from

use super::error::{SavedVarError, StateError};
use super::host::{DataType, HostId, ObjectHost};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Content hash -> previously computed value
pub type CacheTable = BTreeMap<String, Value>;

/// Variable name -> persisted value
pub type SavedVarTable = BTreeMap<String, SavedVar>;

/// A persisted variable, stored as `{"t": tag, "v": value}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVar {
    #[serde(rename = "t")]
    pub data_type: DataType,
    #[serde(rename = "v")]
    pub value: Value,
}

impl SavedVar {
    /// `str` values must be JSON strings; `obj` values may be anything.
    pub fn encode(var_name: &str, data_type: DataType, value: Value) -> Result<Self, SavedVarError> {
        let saved = SavedVar { data_type, value };
        saved.check(var_name)?;
        Ok(saved)
    }

    pub fn decode(&self, var_name: &str) -> Result<Value, SavedVarError> {
        self.check(var_name)?;
        Ok(self.value.clone())
    }

    fn check(&self, var_name: &str) -> Result<(), SavedVarError> {
        match (self.data_type, &self.value) {
            (DataType::Str, Value::String(_)) | (DataType::Obj, _) => Ok(()),
            (DataType::Str, _) => Err(SavedVarError {
                var_name: var_name.to_string(),
                expected: DataType::Str.as_str().to_string(),
            }),
        }
    }
}

/// The tables that outlive a pass. Callers load it before a pass and persist it after.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecContext {
    #[serde(default)]
    pub cache: CacheTable,
    #[serde(default)]
    pub saved: SavedVarTable,
}

impl ExecContext {
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like [ExecContext::load], but a missing file yields empty tables.
    pub fn load_or_default(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            return Ok(ExecContext::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ExecState {
    pub cache_table: CacheTable,
    pub saved_var_table: SavedVarTable,
    hosts: Vec<ObjectHost>,
    host_map: HashMap<String, HostId>,
    /// Raised by a rule to stop the pass after the current step
    pub halt_flag: bool,
    pub last_var_assign: Option<HostId>,
    pub warning_list: Vec<String>,
    /// Incremented after every executed step, used as a cache salt
    pub cmd_pos: usize,
}

impl ExecState {
    pub fn new(ctx: ExecContext) -> Self {
        ExecState {
            cache_table: ctx.cache,
            saved_var_table: ctx.saved,
            ..Default::default()
        }
    }

    /// Copy of the tables to persist.
    pub fn context(&self) -> ExecContext {
        ExecContext {
            cache: self.cache_table.clone(),
            saved: self.saved_var_table.clone(),
        }
    }

    pub fn into_context(self) -> ExecContext {
        ExecContext {
            cache: self.cache_table,
            saved: self.saved_var_table,
        }
    }

    /// Bind `host` under its variable name. The last binding of a name wins.
    pub fn bind(&mut self, host: ObjectHost) -> HostId {
        let id = HostId(self.hosts.len());
        self.host_map.insert(host.var_name.clone(), id);
        self.hosts.push(host);
        self.last_var_assign = Some(id);
        id
    }

    pub fn name_to_obj_host(&self, var_name: &str) -> Option<HostId> {
        self.host_map.get(var_name).copied()
    }

    pub fn host(&self, id: HostId) -> &ObjectHost {
        &self.hosts[id.0]
    }

    pub fn get_content(&mut self, id: HostId) -> Option<Value> {
        let ExecState {
            hosts, cache_table, ..
        } = self;
        hosts[id.0].get_content(cache_table).cloned()
    }

    pub fn get_text(&mut self, id: HostId) -> Option<String> {
        let ExecState {
            hosts, cache_table, ..
        } = self;
        hosts[id.0].get_text(cache_table)
    }

    /// Resolve a host that is not bound yet, such as the one handed to an exec rule.
    pub fn resolve(&mut self, host: &mut ObjectHost) -> Option<Value> {
        host.get_content(&mut self.cache_table).cloned()
    }

    /// Persist a bound variable into the saved table.
    pub fn save_var(&mut self, id: HostId) {
        let value = self.get_content(id);
        let host = &self.hosts[id.0];
        let (var_name, data_type) = (host.var_name.clone(), host.data_type);
        self.store_saved(&var_name, data_type, value);
    }

    /// Persist a host that is not bound yet.
    pub fn save_host(&mut self, host: &mut ObjectHost) {
        let value = self.resolve(host);
        self.store_saved(&host.var_name, host.data_type, value);
    }

    fn store_saved(&mut self, var_name: &str, data_type: DataType, value: Option<Value>) {
        let Some(value) = value else {
            self.add_warning("Save failed because the variable is Undef");
            return;
        };
        match SavedVar::encode(var_name, data_type, value) {
            Ok(saved) => {
                self.saved_var_table.insert(var_name.to_string(), saved);
            }
            Err(err) => self.add_warning(err.to_string()),
        }
    }

    pub fn load_saved_var(&self, var_name: &str) -> Option<&SavedVar> {
        self.saved_var_table.get(var_name)
    }

    pub fn read_cache(&self, hash: &str) -> Option<&Value> {
        self.cache_table.get(hash)
    }

    pub fn save_cache(&mut self, hash: impl Into<String>, content: Value) {
        self.cache_table.insert(hash.into(), content);
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warning_list.push(message.into());
    }

    /// Queue a warning and stop the pass.
    pub fn add_fatal(&mut self, message: impl Into<String>) {
        self.add_warning(message);
        self.halt_flag = true;
    }
}
