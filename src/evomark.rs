//! Main module for evomark library functionality

pub mod ast;
pub mod config;
pub mod core;
pub mod exec;
pub mod formats;
pub mod parsing;
pub mod registry;
pub mod rules;
pub mod testing;
