//! Output formats for evomark trees
//!
//! The only format is evomark source itself: [prettier] turns a tree back into canonical
//! source, driven by [FormattingRules].

pub mod formatting_rules;
pub mod prettier;

pub use formatting_rules::FormattingRules;
pub use prettier::{stringify, stringify_with, Prettier};
