//! Execution layer
//!
//! Resolves variables and runs commands against a parsed tree, mutating it in place. See
//! [engine] for the pass itself, [host] for variable bindings and their cached evaluation,
//! and [state] for the tables that persist between passes.

pub mod engine;
pub mod error;
pub mod host;
pub mod state;
pub mod text;

pub use engine::{get_cmd_list, Executor, HALTED_CMD, ONE_SHOT_CMDS, WARNING_CMD};
pub use error::{ExecError, SavedVarError, StateError};
pub use host::{eval_and_cache, get_hash, DataType, EvalFn, HostId, ObjectHost};
pub use state::{CacheTable, ExecContext, ExecState, SavedVar, SavedVarTable};
pub use text::{eval_to_text, normalize_text};
