//! Parsing module for evomark sources
//!
//! Turns source text into a [Tree](crate::evomark::ast::Tree) in a single recursive-descent
//! pass. The grammar has five constructs:
//!
//! - inline text, cut at paragraph breaks
//! - function calls, `#name(param){body}`, with `#a#b{...}` read as `#a{#b{...}}`
//! - references, `@name = #func{...}`
//! - commands, `$name(param){body}`
//! - variables, `%name` and `%name = $cmd{...}`
//!
//! Bodies are handed to the parse rule registered under the function or command name, see
//! [registry](crate::evomark::registry).

pub mod clauses;
pub mod engine;
pub mod state;

pub use engine::{normalize_lines, ParseOutput, Parser};
pub use state::{ParseState, SavedState};

use crate::evomark::registry::RuleRegistry;

/// Parse `src` with the given registry.
pub fn parse_document(registry: &RuleRegistry, src: &str) -> ParseOutput {
    Parser::new(registry).parse(src)
}
