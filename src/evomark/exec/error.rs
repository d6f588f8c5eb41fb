//! Error types for execution passes

use crate::evomark::ast::NodeKind;
use std::fmt;

/// Fatal errors that abort an execution pass
///
/// Tree mutations done before the failing step stay in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// A `%name` use with no binding in the current pass
    UndefinedVariable(String),
    /// A command or assignment naming a rule that is not registered
    UnknownRule(String),
    /// An assignment node without its command child
    MalformedAssignment(String),
    /// A node kind that should never reach the command loop
    UnexpectedNode(NodeKind),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::UndefinedVariable(name) => write!(f, "Undefined variable %{}", name),
            ExecError::UnknownRule(name) => write!(f, "Cannot find rule {}", name),
            ExecError::MalformedAssignment(name) => {
                write!(f, "Assignment to %{} has no command", name)
            }
            ExecError::UnexpectedNode(kind) => {
                write!(f, "Unexpected {} node in command list", kind)
            }
        }
    }
}

impl std::error::Error for ExecError {}

/// Errors raised while loading or saving a persisted [ExecContext](super::ExecContext)
#[derive(Debug)]
pub enum StateError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Io(err) => write!(f, "Cannot access state file: {}", err),
            StateError::Serde(err) => write!(f, "Malformed state file: {}", err),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Io(err) => Some(err),
            StateError::Serde(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        StateError::Io(err)
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serde(err)
    }
}

/// A saved variable whose value does not fit its type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedVarError {
    pub var_name: String,
    pub expected: String,
}

impl fmt::Display for SavedVarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Saved variable \"{}\" does not hold a {} value",
            self.var_name, self.expected
        )
    }
}

impl std::error::Error for SavedVarError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        assert_eq!(
            ExecError::UndefinedVariable("x".into()).to_string(),
            "Undefined variable %x"
        );
        assert_eq!(
            ExecError::UnknownRule("frob".into()).to_string(),
            "Cannot find rule frob"
        );
        assert_eq!(
            ExecError::UnexpectedNode(NodeKind::Text).to_string(),
            "Unexpected text node in command list"
        );
    }
}
