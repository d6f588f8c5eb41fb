//! Entry point tying the registry to the parser, the executor and the printer

use crate::evomark::ast::Tree;
use crate::evomark::exec::{ExecContext, ExecError, ExecState, Executor};
use crate::evomark::formats::{FormattingRules, Prettier};
use crate::evomark::parsing::{ParseOutput, Parser};
use crate::evomark::registry::RuleRegistry;

/// Owns a rule registry and formatting rules for the lifetime of the host application.
pub struct Evomark {
    registry: RuleRegistry,
    formatting: FormattingRules,
}

impl Default for Evomark {
    fn default() -> Self {
        Self::new()
    }
}

impl Evomark {
    /// Toolchain with every built-in rule.
    pub fn new() -> Self {
        Self::with_registry(RuleRegistry::with_defaults())
    }

    pub fn with_registry(registry: RuleRegistry) -> Self {
        Evomark {
            registry,
            formatting: FormattingRules::default(),
        }
    }

    pub fn with_formatting(mut self, formatting: FormattingRules) -> Self {
        self.formatting = formatting;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Mutable access for registering extra rules before the first parse.
    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    pub fn parse(&self, src: &str) -> ParseOutput {
        Parser::new(&self.registry).parse(src)
    }

    pub fn exec(&self, tree: &mut Tree, ctx: ExecContext) -> Result<ExecState, ExecError> {
        Executor::new(&self.registry).exec(tree, ctx)
    }

    pub fn stringify(&self, tree: &Tree) -> String {
        Prettier::new(self.formatting.clone()).serialize(tree)
    }

    /// Parse and print back in canonical form.
    pub fn format_source(&self, src: &str) -> String {
        self.stringify(&self.parse(src).tree)
    }
}
