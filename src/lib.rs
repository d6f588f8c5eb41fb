//! # evomark
//!
//! Parser, executor and formatter for the evomark markup language.
//!
//! A document goes through three stages:
//!
//! 1. **Parsing**: source text becomes a [Tree](evomark::ast::Tree) of typed nodes
//! 2. **Execution**: variables and commands are resolved in place, with results cached by
//!    content hash across passes
//! 3. **Formatting**: the tree is printed back as canonical source
//!
//! [Evomark](evomark::core::Evomark) bundles the three over one rule registry.
//!
//! ## Testing
//!
//! Tree assertions live in the [testing module](evomark::testing).

pub mod evomark;
