//! Built-in rules
//!
//! - [func]: function rules `box`, `code` and `config`
//! - [cmd]: commands `t`, `init`, `save`, `upper`, `json` and `require`
//! - [literal]: the body parser shared by every command

pub mod cmd;
pub mod func;
pub mod literal;

use crate::evomark::registry::RuleRegistry;
use literal::parse_literal_body;

/// Install every built-in rule except `box`, which [RuleRegistry::new] always carries.
pub fn install_builtins(registry: &mut RuleRegistry) {
    registry.install_parse_rule("code", func::parse_code);
    registry.install_parse_rule("config", func::parse_env_config);
    registry.add_config_namespace(func::CONFIG_NAMESPACE);

    for (name, exec) in cmd::BUILTIN_COMMANDS {
        registry.install_cmd_rule(name, parse_literal_body);
        registry.install_exec_rule(name, exec);
    }
}
